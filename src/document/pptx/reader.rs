/*!
 * Streaming reader for slide and notes parts.
 *
 * Walks `p:spTree` with quick-xml and records, for every text body, the byte
 * range its paragraphs occupy so the writer can splice regenerated XML back in.
 */

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::document::model::{
    Alignment, Anchor, Cell, FontSize, FormattingAttributes, Paragraph, ParagraphExtras, RgbColor,
    Run, Shape, ShapeKind, Table, TextContainer, Underline,
};
use crate::errors::DocumentError;

/// Soft line break inside a run.
pub(crate) const LINE_BREAK: char = '\u{b}';

/// A shape plus the placeholder type it declares, if any.
#[derive(Debug)]
pub(crate) struct ParsedShape {
    pub shape: Shape,
    pub placeholder: Option<String>,
}

impl ParsedShape {
    pub fn into_text_container(self) -> Option<TextContainer> {
        match self.shape.kind {
            ShapeKind::Text(container) => Some(container),
            _ => None,
        }
    }
}

/// Event-level parser over one package part.
pub(crate) struct PartParser<'a> {
    reader: Reader<&'a [u8]>,
    xml: &'a str,
    part_name: &'a str,
    part_index: usize,
}

fn local(e: &BytesStart<'_>) -> Vec<u8> {
    e.local_name().as_ref().to_vec()
}

fn prefix_of(e: &BytesStart<'_>) -> String {
    e.name()
        .prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).to_string())
        .unwrap_or_default()
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

impl<'a> PartParser<'a> {
    pub fn new(part_name: &'a str, part_index: usize, xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);
        Self {
            reader,
            xml,
            part_name,
            part_index,
        }
    }

    fn xml_error(&self, message: impl ToString) -> DocumentError {
        DocumentError::Xml {
            part: self.part_name.to_string(),
            message: message.to_string(),
        }
    }

    /// Next event together with the byte offset where it starts.
    fn next(&mut self) -> Result<(usize, Event<'a>), DocumentError> {
        let position = self.reader.buffer_position();
        match self.reader.read_event() {
            Ok(Event::Eof) => Err(self.xml_error("unexpected end of document")),
            Ok(event) => Ok((position, event)),
            Err(e) => Err(self.xml_error(e)),
        }
    }

    /// Consume everything up to and including the end of the element just opened.
    fn skip(&mut self) -> Result<(), DocumentError> {
        let mut depth = 0usize;
        loop {
            match self.next()?.1 {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(()),
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }
    }

    /// Shapes of the part's first `p:spTree`, in document order.
    pub fn shape_tree(mut self) -> Result<Vec<ParsedShape>, DocumentError> {
        loop {
            let position = self.reader.buffer_position();
            match self.reader.read_event() {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"spTree" => break,
                Ok(Event::Eof) => return Ok(Vec::new()),
                Ok(_) => {}
                Err(e) => return Err(self.xml_error(format!("at byte {}: {}", position, e))),
            }
        }

        let mut shapes = Vec::new();
        loop {
            match self.next()?.1 {
                Event::Start(e) => match local(&e).as_slice() {
                    b"sp" => shapes.push(self.text_shape()?),
                    b"graphicFrame" => shapes.push(ParsedShape {
                        shape: self.graphic_frame()?,
                        placeholder: None,
                    }),
                    b"grpSp" | b"cxnSp" | b"pic" | b"contentPart" => shapes.push(ParsedShape {
                        shape: Shape::other(self.shape_name_and_skip()?),
                        placeholder: None,
                    }),
                    _ => self.skip()?,
                },
                Event::End(_) => break,
                _ => {}
            }
        }

        Ok(shapes)
    }

    /// `p:sp`: name, placeholder type and optional text body.
    fn text_shape(&mut self) -> Result<ParsedShape, DocumentError> {
        let mut name = String::new();
        let mut placeholder = None;
        let mut container = None;
        let mut depth = 0usize;

        loop {
            match self.next()?.1 {
                Event::Start(e) => {
                    let tag = local(&e);
                    if depth == 0 && tag == b"txBody" {
                        container = Some(self.text_body()?);
                        continue;
                    }
                    self.shape_metadata(&e, &mut name, &mut placeholder);
                    depth += 1;
                }
                Event::Empty(e) => self.shape_metadata(&e, &mut name, &mut placeholder),
                Event::End(_) if depth == 0 => break,
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }

        let shape = match container {
            Some(container) => Shape::text(name, container),
            None => Shape::other(name),
        };
        Ok(ParsedShape { shape, placeholder })
    }

    fn shape_metadata(&self, e: &BytesStart<'_>, name: &mut String, placeholder: &mut Option<String>) {
        match e.local_name().as_ref() {
            b"cNvPr" if name.is_empty() => *name = attribute(e, b"name").unwrap_or_default(),
            // A placeholder without a type is a body placeholder
            b"ph" => *placeholder = Some(attribute(e, b"type").unwrap_or_else(|| "body".to_string())),
            _ => {}
        }
    }

    fn shape_name_and_skip(&mut self) -> Result<String, DocumentError> {
        let mut name = String::new();
        let mut depth = 0usize;
        loop {
            match self.next()?.1 {
                Event::Start(e) => {
                    if name.is_empty() && e.local_name().as_ref() == b"cNvPr" {
                        name = attribute(&e, b"name").unwrap_or_default();
                    }
                    depth += 1;
                }
                Event::Empty(e) if name.is_empty() && e.local_name().as_ref() == b"cNvPr" => {
                    name = attribute(&e, b"name").unwrap_or_default();
                }
                Event::End(_) if depth == 0 => return Ok(name),
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }
    }

    /// `p:graphicFrame`: a table when it holds `a:tbl`, otherwise an opaque shape.
    fn graphic_frame(&mut self) -> Result<Shape, DocumentError> {
        let mut name = String::new();
        let mut table = None;
        let mut depth = 0usize;

        loop {
            match self.next()?.1 {
                Event::Start(e) => {
                    let tag = local(&e);
                    if tag == b"tbl" {
                        table = Some(self.table()?);
                        continue;
                    }
                    if name.is_empty() && tag == b"cNvPr" {
                        name = attribute(&e, b"name").unwrap_or_default();
                    }
                    depth += 1;
                }
                Event::Empty(e) if name.is_empty() && e.local_name().as_ref() == b"cNvPr" => {
                    name = attribute(&e, b"name").unwrap_or_default();
                }
                Event::End(_) if depth == 0 => break,
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }

        Ok(match table {
            Some(table) => Shape::table(name, table),
            None => Shape::other(name),
        })
    }

    /// `a:tbl`: rows of cells, each cell with its own text body.
    fn table(&mut self) -> Result<Table, DocumentError> {
        let mut rows: Vec<Vec<Cell>> = Vec::new();

        loop {
            match self.next()?.1 {
                Event::Start(e) => match local(&e).as_slice() {
                    b"tr" => rows.push(self.table_row()?),
                    _ => self.skip()?,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"tr" => rows.push(Vec::new()),
                Event::End(_) => break,
                _ => {}
            }
        }

        Ok(Table::new(rows))
    }

    fn table_row(&mut self) -> Result<Vec<Cell>, DocumentError> {
        let mut cells = Vec::new();

        loop {
            match self.next()?.1 {
                Event::Start(e) => match local(&e).as_slice() {
                    b"tc" => cells.push(self.table_cell()?),
                    _ => self.skip()?,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"tc" => cells.push(Cell::default()),
                Event::End(_) => break,
                _ => {}
            }
        }

        Ok(cells)
    }

    fn table_cell(&mut self) -> Result<Cell, DocumentError> {
        let mut cell = Cell::default();

        loop {
            match self.next()?.1 {
                Event::Start(e) => match local(&e).as_slice() {
                    b"txBody" => cell.text = self.text_body()?,
                    _ => self.skip()?,
                },
                Event::End(_) => break,
                _ => {}
            }
        }

        Ok(cell)
    }

    /// `txBody`: paragraphs plus the byte range they occupy.
    fn text_body(&mut self) -> Result<TextContainer, DocumentError> {
        let mut paragraphs = Vec::new();
        let mut first_paragraph = None;
        let mut prefix = None;

        let end = loop {
            let (position, event) = self.next()?;
            match event {
                Event::Start(e) if e.local_name().as_ref() == b"p" => {
                    first_paragraph.get_or_insert(position);
                    prefix.get_or_insert_with(|| prefix_of(&e));
                    paragraphs.push(self.paragraph()?);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"p" => {
                    first_paragraph.get_or_insert(position);
                    prefix.get_or_insert_with(|| prefix_of(&e));
                    paragraphs.push(Paragraph::new());
                }
                Event::Start(e) => {
                    if prefix.is_none() && e.local_name().as_ref() == b"bodyPr" {
                        prefix = Some(prefix_of(&e));
                    }
                    self.skip()?;
                }
                Event::Empty(e) => {
                    if prefix.is_none() && e.local_name().as_ref() == b"bodyPr" {
                        prefix = Some(prefix_of(&e));
                    }
                }
                Event::End(_) => break position,
                _ => {}
            }
        };

        let anchor = Anchor {
            part: self.part_index,
            span: first_paragraph.unwrap_or(end)..end,
            prefix: prefix.unwrap_or_else(|| "a".to_string()),
        };
        Ok(TextContainer::anchored(paragraphs, anchor))
    }

    fn paragraph(&mut self) -> Result<Paragraph, DocumentError> {
        let mut runs = Vec::new();
        let mut alignment = None;
        let mut level = None;
        let mut extras = ParagraphExtras::default();

        loop {
            let (position, event) = self.next()?;
            match event {
                Event::Start(e) => match local(&e).as_slice() {
                    b"pPr" => {
                        self.paragraph_properties(&e, &mut alignment, &mut level, &mut extras);
                        let children_start = self.reader.buffer_position();
                        let children_end = self.skip_until_end()?;
                        extras.property_children = self.xml[children_start..children_end].to_string();
                    }
                    b"r" | b"fld" => runs.push(self.run()?),
                    b"br" => {
                        let format = self.break_properties()?;
                        runs.push(Run::new(LINE_BREAK.to_string()).formatted(format));
                    }
                    b"endParaRPr" => {
                        self.skip()?;
                        let end = self.reader.buffer_position();
                        extras.end_run_properties = Some(self.xml[position..end].to_string());
                    }
                    _ => self.skip()?,
                },
                Event::Empty(e) => match local(&e).as_slice() {
                    b"pPr" => self.paragraph_properties(&e, &mut alignment, &mut level, &mut extras),
                    b"br" => runs.push(Run::new(LINE_BREAK.to_string())),
                    b"endParaRPr" => {
                        let end = self.reader.buffer_position();
                        extras.end_run_properties = Some(self.xml[position..end].to_string());
                    }
                    _ => {}
                },
                Event::End(_) => break,
                _ => {}
            }
        }

        let mut paragraph = Paragraph::with_runs(runs);
        paragraph.alignment = alignment;
        paragraph.level = level;
        paragraph.extras = extras;
        Ok(paragraph)
    }

    /// Like `skip`, returning the offset where the closing tag starts.
    fn skip_until_end(&mut self) -> Result<usize, DocumentError> {
        let mut depth = 0usize;
        loop {
            let (position, event) = self.next()?;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(position),
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }
    }

    fn paragraph_properties(
        &self,
        e: &BytesStart<'_>,
        alignment: &mut Option<Alignment>,
        level: &mut Option<u8>,
        extras: &mut ParagraphExtras,
    ) {
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = match attr.unescape_value() {
                Ok(value) => value.to_string(),
                Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
            };
            match key.as_str() {
                "algn" => match Alignment::from_ooxml(&value) {
                    Some(a) => *alignment = Some(a),
                    None => extras.properties.push((key, value)),
                },
                "lvl" => match value.parse::<u8>() {
                    Ok(l) => *level = Some(l),
                    Err(_) => extras.properties.push((key, value)),
                },
                _ => extras.properties.push((key, value)),
            }
        }
    }

    /// `a:r` or `a:fld`: properties and text.
    fn run(&mut self) -> Result<Run, DocumentError> {
        let mut run = Run::default();

        loop {
            match self.next()?.1 {
                Event::Start(e) => match local(&e).as_slice() {
                    b"rPr" => {
                        run.format = run_properties(&e);
                        self.run_property_children(&mut run.format)?;
                    }
                    b"t" => run.text.push_str(&self.text_content()?),
                    _ => self.skip()?,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"rPr" => run.format = run_properties(&e),
                Event::End(_) => break,
                _ => {}
            }
        }

        Ok(run)
    }

    /// Properties of a non-empty `a:br`.
    fn break_properties(&mut self) -> Result<FormattingAttributes, DocumentError> {
        let mut format = FormattingAttributes::default();
        loop {
            match self.next()?.1 {
                Event::Start(e) if e.local_name().as_ref() == b"rPr" => {
                    format = run_properties(&e);
                    self.run_property_children(&mut format)?;
                }
                Event::Start(_) => self.skip()?,
                Event::Empty(e) if e.local_name().as_ref() == b"rPr" => format = run_properties(&e),
                Event::End(_) => return Ok(format),
                _ => {}
            }
        }
    }

    /// Fill and latin font from inside an open `a:rPr`.
    fn run_property_children(&mut self, format: &mut FormattingAttributes) -> Result<(), DocumentError> {
        let mut depth = 0usize;
        let mut in_solid_fill = false;

        loop {
            match self.next()?.1 {
                Event::Start(e) => {
                    match e.local_name().as_ref() {
                        b"solidFill" if depth == 0 => in_solid_fill = true,
                        b"srgbClr" if in_solid_fill && depth == 1 => {
                            format.color = attribute(&e, b"val").and_then(|v| RgbColor::from_hex(&v));
                        }
                        b"latin" if depth == 0 => format.font_name = attribute(&e, b"typeface"),
                        _ => {}
                    }
                    depth += 1;
                }
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"srgbClr" if in_solid_fill && depth == 1 => {
                        format.color = attribute(&e, b"val").and_then(|v| RgbColor::from_hex(&v));
                    }
                    b"latin" if depth == 0 => format.font_name = attribute(&e, b"typeface"),
                    _ => {}
                },
                Event::End(_) if depth == 0 => return Ok(()),
                Event::End(e) => {
                    depth -= 1;
                    if depth == 0 && e.local_name().as_ref() == b"solidFill" {
                        in_solid_fill = false;
                    }
                }
                _ => {}
            }
        }
    }

    /// Text of an open `a:t`.
    fn text_content(&mut self) -> Result<String, DocumentError> {
        let mut text = String::new();
        loop {
            match self.next()?.1 {
                Event::Text(t) => {
                    let unescaped = t.unescape().map_err(|e| self.xml_error(e))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
                Event::Start(_) => self.skip()?,
                Event::End(_) => return Ok(text),
                _ => {}
            }
        }
    }
}

/// Attribute-level run properties: bold, italic, underline, size.
fn run_properties(e: &BytesStart<'_>) -> FormattingAttributes {
    let mut format = FormattingAttributes::default();
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"b" => format.bold = parse_bool(&value),
            b"i" => format.italic = parse_bool(&value),
            b"u" => format.underline = Some(Underline::from_ooxml(&value)),
            b"sz" => format.size = value.parse().ok().map(FontSize),
            _ => {}
        }
    }
    format
}
