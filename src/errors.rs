/*!
 * Error types for the deck-translator application.
 *
 * Errors are split along the job's failure boundaries:
 * - `ProviderError`: one failed call to the text-generation backend
 * - `TranslationError`: a unit that could not be translated (local to one text container)
 * - `TransferError`: object storage fetch/store failures (fatal to a job)
 * - `DocumentError`: presentation codec failures (fatal to a job)
 * - `JobError`: the single terminal failure a job reports outward
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The model answered without any text content
    #[error("Response contained no text")]
    EmptyResponse,
}

/// Errors that can occur during translation of a single unit
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The backend kept failing until the attempt budget ran out
    #[error("Translation failed after {attempts} attempts: {source}")]
    Service {
        /// Number of attempts that were made
        attempts: u32,
        /// The last failure observed
        #[source]
        source: ProviderError,
    },

    /// The request was rejected before any call was made
    #[error("Invalid translation request: {0}")]
    InvalidRequest(String),
}

/// Errors raised while moving files in and out of object storage
#[derive(Error, Debug)]
pub enum TransferError {
    /// The requested object does not exist
    #[error("Object not found: {container}/{key}")]
    NotFound {
        /// Bucket or root directory
        container: String,
        /// Object key
        key: String,
    },

    /// Local file access failed
    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage backend reported an error
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by the presentation codec
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The package is not a readable ZIP archive
    #[error("Invalid package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part contains malformed XML
    #[error("Malformed XML in {part}: {message}")]
    Xml {
        /// Part name inside the package
        part: String,
        /// Parser message
        message: String,
    },

    /// A part required to interpret the deck is absent
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// A part is not valid UTF-8
    #[error("Part {0} is not valid UTF-8")]
    Encoding(String),

    /// Reading or writing the local file failed
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// The document was built in memory and has no package to write into
    #[error("Document has no backing package")]
    NoPackage,
}

/// Terminal failure of a translation job
#[derive(Error, Debug)]
pub enum JobError {
    /// Fetching the input or storing the output failed
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// The fetched file could not be opened as a presentation
    #[error("Failed to open document {path}: {source}")]
    DocumentOpen {
        /// Local path of the input copy
        path: PathBuf,
        /// Codec failure
        #[source]
        source: DocumentError,
    },

    /// The translated document could not be written
    #[error("Failed to save document {path}: {source}")]
    DocumentSave {
        /// Local path of the output copy
        path: PathBuf,
        /// Codec failure
        #[source]
        source: DocumentError,
    },

    /// The job's scratch directory could not be prepared
    #[error("Failed to prepare working directory: {0}")]
    Scratch(std::io::Error),

    /// The job request itself is unusable
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),
}
