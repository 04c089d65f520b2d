/*!
 * Slide-deck document model and the presentation codec.
 */

pub mod model;
pub mod pptx;

pub use model::{
    Alignment, Cell, Document, FontSize, FormattingAttributes, Paragraph, RgbColor, Run, Shape,
    ShapeKind, Slide, Table, TextContainer, Underline, strip_invalid_xml_chars,
};
pub use pptx::{open, save};
