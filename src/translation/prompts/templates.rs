/*!
 * Prompt templates for text-unit translation.
 *
 * Both templates ask for the translated text only, so the reply can be split
 * into lines and mapped back onto paragraphs without any post-processing.
 */

/// Separator between the instruction and the text to translate.
pub const TEXT_SEPARATOR: &str = ":\n\n";

/// Translation instruction template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Direct translation.
    pub const STANDARD: &'static str = "Translate the following text from {source_language} to {target_language}, \
maintaining the original format, tone, and meaning. Return only the translated text without any additional explanation";

    /// Analyze terminology and style first; same output contract.
    pub const REASONING: &'static str = "Translate the following text from {source_language} to {target_language}. \
First, analyze key terms and style, then provide an accurate translation that preserves the original format, tone, \
and technical accuracy. Return only the translated text without explanation";

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Template for the given reasoning mode.
    pub fn for_mode(use_reasoning: bool) -> Self {
        if use_reasoning {
            Self::new(Self::REASONING)
        } else {
            Self::new(Self::STANDARD)
        }
    }

    /// Render the instruction followed by the text.
    pub fn render(&self, source_language: &str, target_language: &str, text: &str) -> String {
        let instruction = self
            .template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language);
        format!("{}{}{}", instruction, TEXT_SEPARATOR, text)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(Self::STANDARD)
    }
}

/// Build the complete prompt for one unit.
pub fn build_prompt(text: &str, source_language: &str, target_language: &str, use_reasoning: bool) -> String {
    PromptTemplate::for_mode(use_reasoning).render(source_language, target_language, text)
}

/// The text part of a prompt produced by [`build_prompt`].
pub fn source_text(prompt: &str) -> Option<&str> {
    prompt.split_once(TEXT_SEPARATOR).map(|(_, text)| text)
}
