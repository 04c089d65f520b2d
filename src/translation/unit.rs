/*!
 * Text-unit translation: one text container end to end.
 *
 * The container's formatting is captured first, its full text is sent to the
 * translation client, and the reply is reconciled back onto the paragraph tree.
 * A failed call leaves the container exactly as it was.
 */

use std::fmt;
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

use crate::document::{strip_invalid_xml_chars, TextContainer};
use crate::errors::TranslationError;
use super::client::{TranslationClient, TranslationOptions, TranslationUnit};
use super::formatting::FormattingSnapshot;

/// Where a text container lives in the deck (all indices 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitLocation {
    /// Text frame of a shape
    Shape { slide: usize, shape: usize },
    /// Cell of a table shape
    TableCell {
        slide: usize,
        shape: usize,
        row: usize,
        column: usize,
    },
    /// Speaker notes of a slide
    Notes { slide: usize },
}

impl UnitLocation {
    /// Slide the unit belongs to.
    pub fn slide(&self) -> usize {
        match self {
            Self::Shape { slide, .. } | Self::TableCell { slide, .. } | Self::Notes { slide } => *slide,
        }
    }
}

impl fmt::Display for UnitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape { slide, shape } => write!(f, "slide {} shape {}", slide + 1, shape + 1),
            Self::TableCell {
                slide,
                shape,
                row,
                column,
            } => write!(f, "slide {} table {} cell ({}, {})", slide + 1, shape + 1, row, column),
            Self::Notes { slide } => write!(f, "slide {} notes", slide + 1),
        }
    }
}

/// Lifecycle of a unit: `Pending -> Skipped | InProgress -> Succeeded | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Pending,
    Skipped,
    InProgress,
    Succeeded,
    Failed,
}

impl UnitStatus {
    /// Whether the unit has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Skipped | Self::Succeeded | Self::Failed)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_advance_to(&self, next: UnitStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Succeeded)
                | (Self::InProgress, Self::Failed)
        )
    }
}

/// Result of processing one text container
#[derive(Debug, Clone, Serialize)]
pub struct UnitOutcome {
    /// Container location
    pub location: UnitLocation,

    /// Final state
    pub status: UnitStatus,

    /// Full text before translation
    pub source_text: String,

    /// Full text after reconciliation, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,

    /// Failure message, on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Calls made to the backend
    pub attempts: u32,

    /// Prompt tokens, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,

    /// Completion tokens, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,

    /// Processing time in milliseconds
    pub duration_ms: u64,
}

impl UnitOutcome {
    fn pending(location: UnitLocation, source_text: String) -> Self {
        Self {
            location,
            status: UnitStatus::Pending,
            source_text,
            translated_text: None,
            error: None,
            attempts: 0,
            input_tokens: None,
            output_tokens: None,
            duration_ms: 0,
        }
    }

    fn advance(&mut self, next: UnitStatus) {
        debug_assert!(self.status.can_advance_to(next), "{:?} -> {:?}", self.status, next);
        self.status = next;
    }
}

/// Split a model reply into paragraph lines.
///
/// Splits on `\n` and drops a trailing `\r` from each line; a trailing empty
/// line is kept.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut preview: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview.replace('\n', " / ")
}

/// Translates text containers in place
#[derive(Debug, Clone)]
pub struct TextUnitTranslator {
    client: TranslationClient,
    source_language: String,
    target_language: String,
    options: TranslationOptions,
}

impl TextUnitTranslator {
    /// Create a translator for one language pair.
    pub fn new(
        client: TranslationClient,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        options: TranslationOptions,
    ) -> Self {
        Self {
            client,
            source_language: source_language.into(),
            target_language: target_language.into(),
            options,
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    /// Source language identifier.
    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    /// Target language identifier.
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Translate one container and write the result back into it.
    ///
    /// Blank containers are skipped without a call. On failure the container
    /// is left untouched and the outcome is `Failed`; nothing is returned as
    /// an error.
    pub async fn translate_container(&self, container: &mut TextContainer, location: UnitLocation) -> UnitOutcome {
        let start_time = Instant::now();
        let source_text = container.full_text();
        let mut outcome = UnitOutcome::pending(location, source_text.clone());

        if container.is_blank() {
            outcome.advance(UnitStatus::Skipped);
            return outcome;
        }

        let snapshot = FormattingSnapshot::capture(container);
        outcome.advance(UnitStatus::InProgress);
        info!("Translating {}: {}", location, preview(&source_text, 50));

        let unit = TranslationUnit::new(
            source_text,
            self.source_language.clone(),
            self.target_language.clone(),
            self.options.clone(),
        );

        match self.client.translate_unit(&unit).await {
            Ok(translation) => {
                let reply = strip_invalid_xml_chars(&translation.text);
                if reply.len() != translation.text.len() {
                    warn!("Dropped control characters from the reply for {}", location);
                }
                let lines = split_lines(&reply);
                // An unchanged reply keeps the original runs as they are
                if lines.join("\n") != unit.text {
                    snapshot.apply(container, &lines);
                }

                let new_text = container.full_text();
                info!("Translated {}: {}", location, preview(&new_text, 80));
                outcome.advance(UnitStatus::Succeeded);
                outcome.translated_text = Some(new_text);
                outcome.attempts = translation.attempts;
                outcome.input_tokens = translation.input_tokens;
                outcome.output_tokens = translation.output_tokens;
            }
            Err(e) => {
                warn!("Leaving {} untranslated: {}", location, e);
                outcome.advance(UnitStatus::Failed);
                outcome.error = Some(e.to_string());
                outcome.attempts = match &e {
                    TranslationError::Service { attempts, .. } => *attempts,
                    _ => 0,
                };
            }
        }

        outcome.duration_ms = start_time.elapsed().as_millis() as u64;
        outcome
    }
}
