/*!
 * Document traversal.
 *
 * Visits every text container of a deck exactly once, in presentation order:
 * slides in order, shapes in order, table cells row-major, speaker notes last
 * within their slide. Each container goes through the `TextUnitTranslator`;
 * a failing unit is recorded and the walk moves on.
 */

use std::time::{Duration, Instant};

use log::info;
use serde::Serialize;

use crate::document::{Document, ShapeKind, TextContainer};
use super::unit::{TextUnitTranslator, UnitLocation, UnitOutcome, UnitStatus};

/// Aggregated result of one walk
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    /// Per-container outcomes in traversal order
    pub outcomes: Vec<UnitOutcome>,

    /// Units counted by the pre-pass
    pub total_units: usize,

    /// Units translated and written back
    pub succeeded: usize,

    /// Units left in the source language
    pub failed: usize,

    /// Blank containers
    pub skipped: usize,

    /// Prompt tokens across all calls
    pub input_tokens: u64,

    /// Completion tokens across all calls
    pub output_tokens: u64,

    /// Wall time of the walk
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

impl WalkReport {
    fn record(&mut self, outcome: UnitOutcome) {
        match outcome.status {
            UnitStatus::Succeeded => self.succeeded += 1,
            UnitStatus::Failed => self.failed += 1,
            UnitStatus::Skipped => self.skipped += 1,
            UnitStatus::Pending | UnitStatus::InProgress => {}
        }
        self.input_tokens += outcome.input_tokens.unwrap_or(0);
        self.output_tokens += outcome.output_tokens.unwrap_or(0);
        self.outcomes.push(outcome);
    }

    /// Whether every non-blank unit was translated.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Outcomes of failed units.
    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|o| o.status == UnitStatus::Failed)
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped ({} units, {} tokens in / {} out, {:.1}s)",
            self.succeeded,
            self.failed,
            self.skipped,
            self.total_units,
            self.input_tokens,
            self.output_tokens,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Count the units a walk will send for translation.
///
/// Text shapes, table cells and notes count only when non-blank.
pub fn count_units(document: &Document) -> usize {
    document
        .text_containers()
        .into_iter()
        .filter(|container| !container.is_blank())
        .count()
}

/// Walks a document through a `TextUnitTranslator`
#[derive(Debug)]
pub struct DocumentWalker<'a> {
    translator: &'a TextUnitTranslator,
}

struct Progress<F> {
    processed: usize,
    total: usize,
    callback: F,
}

impl<'a> DocumentWalker<'a> {
    /// Create a walker.
    pub fn new(translator: &'a TextUnitTranslator) -> Self {
        Self { translator }
    }

    /// Translate every container of the document in place.
    ///
    /// `on_progress(processed, total)` is called after each non-blank unit.
    pub async fn walk<F>(&self, document: &mut Document, on_progress: F) -> WalkReport
    where
        F: FnMut(usize, usize),
    {
        let start_time = Instant::now();
        let total = count_units(document);
        let mut report = WalkReport {
            total_units: total,
            ..WalkReport::default()
        };
        let mut progress = Progress {
            processed: 0,
            total,
            callback: on_progress,
        };

        let slide_count = document.slides.len();
        for (slide_index, slide) in document.slides.iter_mut().enumerate() {
            info!("Processing slide {}/{}", slide_index + 1, slide_count);

            for (shape_index, shape) in slide.shapes.iter_mut().enumerate() {
                match &mut shape.kind {
                    ShapeKind::Text(container) => {
                        let location = UnitLocation::Shape {
                            slide: slide_index,
                            shape: shape_index,
                        };
                        self.visit(container, location, &mut report, &mut progress).await;
                    }
                    ShapeKind::Table(table) => {
                        for (row_index, row) in table.rows.iter_mut().enumerate() {
                            for (column_index, cell) in row.iter_mut().enumerate() {
                                let location = UnitLocation::TableCell {
                                    slide: slide_index,
                                    shape: shape_index,
                                    row: row_index,
                                    column: column_index,
                                };
                                self.visit(&mut cell.text, location, &mut report, &mut progress).await;
                            }
                        }
                    }
                    ShapeKind::Other => {}
                }
            }

            if let Some(notes) = slide.notes.as_mut() {
                let location = UnitLocation::Notes { slide: slide_index };
                self.visit(notes, location, &mut report, &mut progress).await;
            }
        }

        report.elapsed = start_time.elapsed();
        info!("Translation finished: {}", report.summary());
        report
    }

    async fn visit<F>(
        &self,
        container: &mut TextContainer,
        location: UnitLocation,
        report: &mut WalkReport,
        progress: &mut Progress<F>,
    ) where
        F: FnMut(usize, usize),
    {
        let outcome = self.translator.translate_container(container, location).await;
        if outcome.status != UnitStatus::Skipped {
            progress.processed += 1;
            (progress.callback)(progress.processed, progress.total);
        }
        report.record(outcome);
    }
}
