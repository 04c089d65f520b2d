/*!
 * DrawingML paragraph serialization and part splicing.
 */

use std::ops::Range;

use quick_xml::escape::escape;

use super::reader::LINE_BREAK;
use crate::document::model::{strip_invalid_xml_chars, FormattingAttributes, Paragraph, Run};

/// Qualified element name for the container's DrawingML prefix.
struct Names<'a> {
    prefix: &'a str,
}

impl Names<'_> {
    fn tag(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }
}

/// Serialize paragraphs as `<a:p>` elements.
pub(crate) fn paragraphs_xml(prefix: &str, paragraphs: &[Paragraph]) -> String {
    let names = Names { prefix };
    let mut out = String::new();
    for paragraph in paragraphs {
        write_paragraph(&mut out, &names, paragraph);
    }
    out
}

fn write_paragraph(out: &mut String, names: &Names<'_>, paragraph: &Paragraph) {
    let p = names.tag("p");
    out.push('<');
    out.push_str(&p);
    out.push('>');

    write_paragraph_properties(out, names, paragraph);
    for run in paragraph.runs() {
        write_run(out, names, run);
    }
    if let Some(end) = &paragraph.extras.end_run_properties {
        out.push_str(end);
    }

    out.push_str("</");
    out.push_str(&p);
    out.push('>');
}

fn write_paragraph_properties(out: &mut String, names: &Names<'_>, paragraph: &Paragraph) {
    let extras = &paragraph.extras;
    if paragraph.alignment.is_none()
        && paragraph.level.is_none()
        && extras.properties.is_empty()
        && extras.property_children.is_empty()
    {
        return;
    }

    let ppr = names.tag("pPr");
    out.push('<');
    out.push_str(&ppr);
    for (key, value) in &extras.properties {
        push_attribute(out, key, value);
    }
    if let Some(level) = paragraph.level {
        push_attribute(out, "lvl", &level.to_string());
    }
    if let Some(alignment) = paragraph.alignment {
        push_attribute(out, "algn", alignment.as_ooxml());
    }

    if extras.property_children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        out.push_str(&extras.property_children);
        out.push_str("</");
        out.push_str(&ppr);
        out.push('>');
    }
}

fn write_run(out: &mut String, names: &Names<'_>, run: &Run) {
    if run.text.is_empty() {
        write_text_run(out, names, &run.format, "");
        return;
    }

    for (i, segment) in run.text.split(LINE_BREAK).enumerate() {
        if i > 0 {
            let br = names.tag("br");
            if run.format.is_empty() {
                out.push('<');
                out.push_str(&br);
                out.push_str("/>");
            } else {
                out.push('<');
                out.push_str(&br);
                out.push('>');
                write_run_properties(out, names, &run.format);
                out.push_str("</");
                out.push_str(&br);
                out.push('>');
            }
        }
        if !segment.is_empty() {
            write_text_run(out, names, &run.format, segment);
        }
    }
}

fn write_text_run(out: &mut String, names: &Names<'_>, format: &FormattingAttributes, text: &str) {
    let r = names.tag("r");
    let t = names.tag("t");
    out.push('<');
    out.push_str(&r);
    out.push('>');
    write_run_properties(out, names, format);
    if text.is_empty() {
        out.push('<');
        out.push_str(&t);
        out.push_str("/>");
    } else {
        out.push('<');
        out.push_str(&t);
        out.push('>');
        out.push_str(&escape(&strip_invalid_xml_chars(text)));
        out.push_str("</");
        out.push_str(&t);
        out.push('>');
    }
    out.push_str("</");
    out.push_str(&r);
    out.push('>');
}

fn write_run_properties(out: &mut String, names: &Names<'_>, format: &FormattingAttributes) {
    if format.is_empty() {
        return;
    }

    let rpr = names.tag("rPr");
    out.push('<');
    out.push_str(&rpr);
    if let Some(size) = format.size {
        push_attribute(out, "sz", &size.0.to_string());
    }
    if let Some(bold) = format.bold {
        push_attribute(out, "b", if bold { "1" } else { "0" });
    }
    if let Some(italic) = format.italic {
        push_attribute(out, "i", if italic { "1" } else { "0" });
    }
    if let Some(underline) = &format.underline {
        push_attribute(out, "u", underline.as_ooxml());
    }

    if format.color.is_none() && format.font_name.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    // Schema order: fill before fonts
    if let Some(color) = format.color {
        out.push_str(&format!(
            "<{fill}><{clr} val=\"{hex}\"/></{fill}>",
            fill = names.tag("solidFill"),
            clr = names.tag("srgbClr"),
            hex = color.to_hex()
        ));
    }
    if let Some(font) = &format.font_name {
        out.push('<');
        out.push_str(&names.tag("latin"));
        push_attribute(out, "typeface", font);
        out.push_str("/>");
    }

    out.push_str("</");
    out.push_str(&rpr);
    out.push('>');
}

fn push_attribute(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

/// Replace byte ranges of `original` with new content.
///
/// Ranges must not overlap; they are applied in document order.
pub(crate) fn splice(original: &str, edits: &mut [(Range<usize>, String)]) -> String {
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(original.len() + edits.iter().map(|(_, s)| s.len()).sum::<usize>());
    let mut cursor = 0;
    for (range, replacement) in edits.iter() {
        out.push_str(&original[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&original[cursor..]);
    out
}
