/*!
 * Core document model types for slide-deck translation.
 *
 * The tree is strictly owned: a `Document` owns its slides, a slide owns its
 * shapes and optional speaker notes, and every text-bearing element owns a
 * `TextContainer` of paragraphs and runs. There are no back references, so a
 * container can be mutated without touching any other part of the deck.
 */

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use super::pptx::Package;

/// A presentation: an ordered sequence of slides.
#[derive(Debug, Default)]
pub struct Document {
    /// Slides in presentation order
    pub slides: Vec<Slide>,

    /// Source package the deck was read from (absent for in-memory decks)
    pub(crate) package: Option<Package>,
}

impl Document {
    /// Create an in-memory document from slides.
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            package: None,
        }
    }

    /// Whether the document was read from a package and can be saved.
    pub fn has_package(&self) -> bool {
        self.package.is_some()
    }

    /// All text containers in traversal order.
    ///
    /// Order: slides in order; within a slide, shapes in order (table cells
    /// row-major); the slide's speaker notes last.
    pub fn text_containers(&self) -> Vec<&TextContainer> {
        let mut containers = Vec::new();
        for slide in &self.slides {
            for shape in &slide.shapes {
                match &shape.kind {
                    ShapeKind::Text(container) => containers.push(container),
                    ShapeKind::Table(table) => {
                        containers.extend(table.rows.iter().flatten().map(|cell| &cell.text));
                    }
                    ShapeKind::Other => {}
                }
            }
            if let Some(notes) = &slide.notes {
                containers.push(notes);
            }
        }
        containers
    }
}

/// A single slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slide {
    /// Shapes in z-order as stored in the slide
    pub shapes: Vec<Shape>,

    /// Speaker notes text frame, when the slide has a notes page
    pub notes: Option<TextContainer>,
}

impl Slide {
    /// Create a slide with the given shapes and no notes.
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes, notes: None }
    }

    /// Attach speaker notes.
    pub fn with_notes(mut self, notes: TextContainer) -> Self {
        self.notes = Some(notes);
        self
    }
}

/// A shape on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Shape name (`cNvPr@name`), empty when unknown
    pub name: String,

    /// What the shape carries
    pub kind: ShapeKind,
}

impl Shape {
    /// A shape holding a text frame.
    pub fn text(name: impl Into<String>, container: TextContainer) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::Text(container),
        }
    }

    /// A shape holding a table.
    pub fn table(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::Table(table),
        }
    }

    /// A shape without translatable text (picture, connector, group).
    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::Other,
        }
    }
}

/// Content kind of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Text frame
    Text(TextContainer),
    /// Table of cells
    Table(Table),
    /// Anything else; ignored by translation
    Other,
}

/// A 2-D grid of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Rows of cells
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table from rows.
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Number of columns in the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// The cell's text frame
    pub text: TextContainer,
}

impl Cell {
    /// Create a cell around a text container.
    pub fn new(text: TextContainer) -> Self {
        Self { text }
    }
}

/// Location of a container's paragraph region inside its package part.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Anchor {
    /// Index of the part in the package entry list
    pub part: usize,
    /// Byte range of the paragraph elements in the part's XML
    pub span: Range<usize>,
    /// Namespace prefix used for DrawingML elements (usually `a`)
    pub prefix: String,
}

/// Any element holding paragraphs: a shape's text frame, a table cell, speaker notes.
///
/// Paragraphs can be edited and appended but never removed.
#[derive(Debug, Clone, Default)]
pub struct TextContainer {
    paragraphs: Vec<Paragraph>,
    pub(crate) anchor: Option<Anchor>,
    modified: bool,
}

impl TextContainer {
    /// Create a container from paragraphs.
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            anchor: None,
            modified: false,
        }
    }

    /// Container with one single-run paragraph per line of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split('\n').map(Paragraph::from_text).collect())
    }

    pub(crate) fn anchored(paragraphs: Vec<Paragraph>, anchor: Anchor) -> Self {
        Self {
            paragraphs,
            anchor: Some(anchor),
            modified: false,
        }
    }

    /// Paragraphs in order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Mutable access to all paragraphs (no insertion or removal).
    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        self.modified = true;
        &mut self.paragraphs
    }

    /// Append a new, empty paragraph with default layout.
    pub fn add_paragraph(&mut self) -> &mut Paragraph {
        self.modified = true;
        self.paragraphs.push(Paragraph::new());
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Paragraph texts joined by newline: the unit of translation.
    pub fn full_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the full text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.paragraphs
            .iter()
            .all(|p| p.runs.iter().all(|r| r.text.trim().is_empty()))
    }

    /// Whether the container was mutated since it was read.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl PartialEq for TextContainer {
    fn eq(&self, other: &Self) -> bool {
        self.paragraphs == other.paragraphs
    }
}

/// Paragraph XML the model does not interpret but must carry through.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParagraphExtras {
    /// `a:pPr` attributes other than `algn` and `lvl`
    pub properties: Vec<(String, String)>,
    /// Raw child elements of `a:pPr`
    pub property_children: String,
    /// Raw `a:endParaRPr` element
    pub end_run_properties: Option<String>,
}

impl ParagraphExtras {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.property_children.is_empty()
            && self.end_run_properties.is_none()
    }
}

/// An ordered sequence of runs plus layout attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    runs: Vec<Run>,

    /// Horizontal alignment; `None` inherits from the layout
    pub alignment: Option<Alignment>,

    /// Indent (outline) level 0-8; `None` inherits
    pub level: Option<u8>,

    pub(crate) extras: ParagraphExtras,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph from runs.
    pub fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Paragraph holding a single unformatted run (none for empty text).
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Self::new()
        } else {
            Self::with_runs(vec![Run::new(text)])
        }
    }

    /// Set the alignment.
    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Set the indent level.
    pub fn at_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Runs in order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Mutable runs.
    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Remove every run, keeping the paragraph and its layout in place.
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Append a run and return it for formatting.
    pub fn add_run(&mut self, text: impl Into<String>) -> &mut Run {
        self.runs.push(Run::new(text));
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }
}

/// A styled text span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    /// Run text; a vertical tab stands for a soft line break
    pub text: String,

    /// Character formatting
    pub format: FormattingAttributes,
}

impl Run {
    /// Create an unformatted run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: FormattingAttributes::default(),
        }
    }

    /// Set the formatting.
    pub fn formatted(mut self, format: FormattingAttributes) -> Self {
        self.format = format;
        self
    }
}

/// Character formatting of a run. Every field is optional; `None` means
/// "inherit" and is never written out as an explicit value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattingAttributes {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<Underline>,
    pub size: Option<FontSize>,
    pub font_name: Option<String>,
    pub color: Option<RgbColor>,
}

impl FormattingAttributes {
    /// Copy every attribute that is set in `source`, leaving the rest untouched.
    pub fn apply_present(&mut self, source: &FormattingAttributes) {
        if let Some(bold) = source.bold {
            self.bold = Some(bold);
        }
        if let Some(italic) = source.italic {
            self.italic = Some(italic);
        }
        if let Some(underline) = &source.underline {
            self.underline = Some(underline.clone());
        }
        if let Some(size) = source.size {
            self.size = Some(size);
        }
        if let Some(font_name) = &source.font_name {
            self.font_name = Some(font_name.clone());
        }
        if let Some(color) = source.color {
            self.color = Some(color);
        }
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Paragraph alignment (`a:pPr@algn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    JustifyLow,
    Distributed,
    ThaiDistributed,
}

impl Alignment {
    /// Parse the OOXML attribute value.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" => Some(Self::Justify),
            "justLow" => Some(Self::JustifyLow),
            "dist" => Some(Self::Distributed),
            "thaiDist" => Some(Self::ThaiDistributed),
            _ => None,
        }
    }

    /// The OOXML attribute value.
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            Self::Left => "l",
            Self::Center => "ctr",
            Self::Right => "r",
            Self::Justify => "just",
            Self::JustifyLow => "justLow",
            Self::Distributed => "dist",
            Self::ThaiDistributed => "thaiDist",
        }
    }
}

/// Underline style (`a:rPr@u`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Underline {
    /// Explicitly not underlined
    None,
    Single,
    Double,
    /// Any other ST_TextUnderlineType value, kept verbatim
    Style(String),
}

impl Underline {
    pub fn from_ooxml(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "sng" => Self::Single,
            "dbl" => Self::Double,
            other => Self::Style(other.to_string()),
        }
    }

    pub fn as_ooxml(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Single => "sng",
            Self::Double => "dbl",
            Self::Style(value) => value,
        }
    }
}

/// Font size in hundredths of a point (`a:rPr@sz`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSize(pub u32);

impl FontSize {
    /// Size from whole points.
    pub fn from_points(points: u32) -> Self {
        Self(points * 100)
    }

    /// Size in points.
    pub fn points(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

/// 24-bit RGB color (`a:srgbClr@val`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    /// Parse a six-digit hex value such as `1F4E79`.
    pub fn from_hex(value: &str) -> Option<Self> {
        if value.len() != 6 || !value.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&value[i..i + 2], 16).ok();
        Some(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Upper-case hex representation.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Drop characters XML 1.0 does not allow in text content.
///
/// Tab, line feed, carriage return and the vertical tab that marks a line
/// break are kept.
pub fn strip_invalid_xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_text_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_text_char(*c)).collect())
    }
}

fn is_xml_text_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' | '\u{b}' => true,
        '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => false,
        _ => true,
    }
}
