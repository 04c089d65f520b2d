/*!
 * Format preservation for translated text.
 *
 * A `FormattingSnapshot` records, per paragraph of a text container, the
 * paragraph layout and the character formatting of its first run. After the
 * container's text has been replaced the snapshot is applied back with
 * "set if present" semantics: attributes the source never set stay unset.
 */

use crate::document::{Alignment, FormattingAttributes, Paragraph, TextContainer};

/// Formatting captured from one paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphFormat {
    /// Paragraph alignment
    pub alignment: Option<Alignment>,

    /// Indent level
    pub level: Option<u8>,

    /// Character formatting of the first run; `None` when the paragraph had no runs
    pub first_run: Option<FormattingAttributes>,
}

impl ParagraphFormat {
    fn capture(paragraph: &Paragraph) -> Self {
        Self {
            alignment: paragraph.alignment,
            level: paragraph.level,
            first_run: paragraph.runs().first().map(|run| run.format.clone()),
        }
    }

    /// Apply alignment and level where recorded.
    pub fn apply_layout(&self, paragraph: &mut Paragraph) {
        if let Some(alignment) = self.alignment {
            paragraph.alignment = Some(alignment);
        }
        if let Some(level) = self.level {
            paragraph.level = Some(level);
        }
    }

    /// Apply the recorded first-run attributes to `format`.
    pub fn apply_run_format(&self, format: &mut FormattingAttributes) {
        if let Some(first_run) = &self.first_run {
            format.apply_present(first_run);
        }
    }
}

/// Immutable copy of a container's formatting, indexed by original paragraph position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattingSnapshot {
    paragraphs: Vec<ParagraphFormat>,
}

impl FormattingSnapshot {
    /// Capture the formatting of every paragraph in the container.
    pub fn capture(container: &TextContainer) -> Self {
        Self {
            paragraphs: container.paragraphs().iter().map(ParagraphFormat::capture).collect(),
        }
    }

    /// Number of paragraphs captured.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether the source container had no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Captured formatting for paragraph `index`.
    pub fn get(&self, index: usize) -> Option<&ParagraphFormat> {
        self.paragraphs.get(index)
    }

    /// Replace the container's text with `lines`, one paragraph per line.
    ///
    /// Line `i` reuses paragraph `i` when it exists (runs cleared, paragraph
    /// kept in place) or appends a new paragraph. Each resulting paragraph
    /// holds exactly one run with the line text. Paragraphs covered by the
    /// snapshot get their layout and first-run formatting back; appended
    /// ones keep the defaults. Original paragraphs beyond the last line are
    /// cleared to zero runs, never removed.
    pub fn apply(&self, container: &mut TextContainer, lines: &[&str]) {
        let original_count = container.paragraph_count();

        for (i, line) in lines.iter().enumerate() {
            if i >= container.paragraph_count() {
                container.add_paragraph();
            }
            let paragraph = &mut container.paragraphs_mut()[i];
            paragraph.clear();

            let format = self.paragraphs.get(i);
            if let Some(format) = format {
                format.apply_layout(paragraph);
            }
            let run = paragraph.add_run(*line);
            if let Some(format) = format {
                format.apply_run_format(&mut run.format);
            }
        }

        for paragraph in container.paragraphs_mut().iter_mut().take(original_count).skip(lines.len()) {
            paragraph.clear();
        }
    }

    /// Re-apply layout and first-run formatting without touching text.
    pub fn restyle(&self, container: &mut TextContainer) {
        for (paragraph, format) in container.paragraphs_mut().iter_mut().zip(&self.paragraphs) {
            format.apply_layout(paragraph);
            if let Some(run) = paragraph.runs_mut().first_mut() {
                format.apply_run_format(&mut run.format);
            }
        }
    }
}
