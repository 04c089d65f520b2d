/*!
 * Prompt construction for translation calls.
 *
 * - `templates`: standard and extended-reasoning instruction templates
 */

pub mod templates;

// Re-export main types
pub use templates::{build_prompt, source_text, PromptTemplate};
