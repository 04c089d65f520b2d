/*!
 * Translation pipeline for slide decks.
 *
 * This module contains the structure-preserving translation core. It is
 * split into several submodules:
 *
 * - `client`: the external translation call with retry and backoff
 * - `prompts`: prompt templates for standard and reasoning modes
 * - `formatting`: formatting snapshots and paragraph reconciliation
 * - `unit`: translation of one text container
 * - `walker`: traversal of a whole document
 */

// Re-export main types for easier usage
pub use self::client::{RetryPolicy, Translation, TranslationClient, TranslationOptions, TranslationUnit};
pub use self::formatting::{FormattingSnapshot, ParagraphFormat};
pub use self::unit::{TextUnitTranslator, UnitLocation, UnitOutcome, UnitStatus};
pub use self::walker::{DocumentWalker, WalkReport};

// Submodules
pub mod client;
pub mod formatting;
pub mod prompts;
pub mod unit;
pub mod walker;
