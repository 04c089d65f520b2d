use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};
use uuid::Uuid;

use crate::app_config::Config;
use crate::document;
use crate::errors::{JobError, ProviderError, TranslationError};
use crate::file_utils::FileManager;
use crate::storage::{self, Locator, ObjectStore, StoreReceipt};
use crate::translation::{DocumentWalker, TextUnitTranslator, TranslationClient, WalkReport};

// @module: Application controller for deck translation

/// Name of the local copy of a fetched deck
const SCRATCH_INPUT: &str = "input.pptx";

/// Name of the translated deck before upload
const SCRATCH_OUTPUT: &str = "output.pptx";

/// One object-store translation request
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    // @field: Deck to translate
    pub input: Locator,

    // @field: Language overrides; the configuration applies when absent
    pub source_language: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S3Event {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
struct S3EventRecord {
    s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

impl JobRequest {
    /// Request for one object with the configured languages
    pub fn new(input: Locator) -> Self {
        Self {
            input,
            source_language: None,
            target_language: None,
        }
    }

    /// Override the language pair
    pub fn with_languages(mut self, source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        self.source_language = Some(source_language.into());
        self.target_language = Some(target_language.into());
        self
    }

    /// Build a request from an S3 notification; only the first record is used
    pub fn from_s3_event(event_json: &str) -> Result<Self, JobError> {
        let event: S3Event = serde_json::from_str(event_json)
            .map_err(|e| JobError::InvalidRequest(format!("Malformed event: {}", e)))?;

        let entity = event
            .records
            .into_iter()
            .next()
            .ok_or_else(|| JobError::InvalidRequest("Event has no records".to_string()))?
            .s3
            .ok_or_else(|| JobError::InvalidRequest("Event record is not an S3 notification".to_string()))?;

        if entity.bucket.name.is_empty() || entity.object.key.is_empty() {
            return Err(JobError::InvalidRequest("Event names no bucket or key".to_string()));
        }

        Ok(Self::new(Locator::new(entity.bucket.name, entity.object.key)))
    }
}

/// Outcome of one object-store job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    // @field: Correlation id for logs
    pub job_id: Uuid,

    // @field: Source object
    pub input: Locator,

    // @field: Uploaded result
    pub output: StoreReceipt,

    // @field: Per-unit outcomes and tallies
    pub report: WalkReport,

    // @field: Wall time of the whole job
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Outcome of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller for deck translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Model client shared by every job of this process
    client: TranslationClient,

    // @field: Object storage for jobs
    store: Box<dyn ObjectStore>,

    // @field: Whether to draw progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub async fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let client = TranslationClient::from_config(&config.translation).await?;
        let store = storage::from_config(&config.storage).await;
        Ok(Self::with_parts(config, client, store))
    }

    // @method: Create a controller around existing collaborators
    pub fn with_parts(config: Config, client: TranslationClient, store: Box<dyn ObjectStore>) -> Self {
        Self {
            config,
            client,
            store,
            show_progress: true,
        }
    }

    /// Disable progress bars (non-interactive runs and tests)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translation client
    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    fn translator(&self, source_language: Option<&str>, target_language: Option<&str>) -> TextUnitTranslator {
        TextUnitTranslator::new(
            self.client.clone(),
            source_language.unwrap_or(&self.config.source_language),
            target_language.unwrap_or(&self.config.target_language),
            self.config.translation.options(),
        )
    }

    fn progress_bar(&self, multi_progress: &MultiProgress, length: u64, unit: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = multi_progress.add(ProgressBar::new(length));
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Open, translate and save one deck on the local filesystem
    pub async fn translate_file(&self, input_file: &Path, output_file: &Path) -> Result<WalkReport, JobError> {
        let multi_progress = MultiProgress::new();
        let translator = self.translator(None, None);
        self.translate_file_with(&translator, input_file, output_file, &multi_progress).await
    }

    async fn translate_file_with(
        &self,
        translator: &TextUnitTranslator,
        input_file: &Path,
        output_file: &Path,
        multi_progress: &MultiProgress,
    ) -> Result<WalkReport, JobError> {
        let mut deck = document::open(input_file).map_err(|source| JobError::DocumentOpen {
            path: input_file.to_path_buf(),
            source,
        })?;
        debug!("Opened {} with {} slides", input_file.display(), deck.slides.len());

        info!("🚀 {}: {} - {}", input_file.display(), self.client.provider_name(), self.client.model_id());

        let progress_bar = self.progress_bar(multi_progress, 0, "units");
        progress_bar.set_message("Translating");
        let pb = progress_bar.clone();
        let report = DocumentWalker::new(translator)
            .walk(&mut deck, move |processed, total| {
                pb.set_length(total as u64);
                pb.set_position(processed as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        for failure in report.failures() {
            warn!("Untranslated {}: {}", failure.location, failure.error.as_deref().unwrap_or("unknown error"));
        }

        document::save(&deck, output_file).map_err(|source| JobError::DocumentSave {
            path: output_file.to_path_buf(),
            source,
        })?;
        info!("Success: {}", output_file.display());

        Ok(report)
    }

    /// Run the local workflow for one deck; returns `None` when the output already exists
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>, force_overwrite: bool) -> Result<Option<WalkReport>> {
        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_file = output_file.unwrap_or_else(|| self.default_output_path(&input_file));
        if output_file.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(None);
        }
        if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent)?;
        }

        let start_time = Instant::now();
        let report = self.translate_file(&input_file, &output_file).await?;
        info!("{} in {}", report.summary(), Self::format_duration(start_time.elapsed()));
        Ok(Some(report))
    }

    fn default_output_path(&self, input_file: &Path) -> PathBuf {
        let output_dir = input_file.parent().unwrap_or_else(|| Path::new(""));
        FileManager::generate_output_path(input_file, output_dir, &self.config.target_language)
    }

    /// Run the workflow in folder mode, processing every deck below a directory
    /// Decks that already have a translation will be skipped
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let decks = FileManager::find_presentations(&input_dir, &self.config.target_language)?;
        if decks.is_empty() {
            return Err(anyhow!("No presentation files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = self.progress_bar(&multi_progress, decks.len() as u64, "files");
        folder_pb.set_message("Processing files");

        let translator = self.translator(None, None);
        let mut summary = FolderSummary::default();

        for deck in decks.iter() {
            let file_name = deck.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_file = self.default_output_path(deck);
            if output_file.exists() && !force_overwrite {
                warn!("Skipping {}, translation already exists (use -f to force overwrite)", file_name);
                summary.skipped += 1;
                folder_pb.inc(1);
                continue;
            }

            match self.translate_file_with(&translator, deck, &output_file, &multi_progress).await {
                Ok(report) => {
                    info!("{}: {}", file_name, report.summary());
                    summary.processed += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.errors += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary_message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.errors
        );
        info!("{}", summary_message);

        let log_file_path = input_dir.join("deck-translator.log");
        let entry = format!("{} ({}) - Duration: {}",
            summary_message,
            input_dir.display(),
            Self::format_duration(start_time.elapsed()));
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &entry) {
            warn!("Failed to write folder log: {}", e);
        }

        Ok(summary)
    }

    /// Output location of a job: `<prefix><basename>` in the output bucket
    pub fn output_locator(&self, input: &Locator) -> Locator {
        let container = self
            .config
            .storage
            .output_bucket
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| input.container.clone());
        Locator::new(container, format!("{}{}", self.config.storage.output_prefix, input.basename()))
    }

    /// Fetch a deck from object storage, translate it and upload the result
    pub async fn run_job(&self, request: JobRequest) -> Result<JobReport, JobError> {
        let start_time = Instant::now();
        let job_id = Uuid::new_v4();
        info!("Job {}: {} via {}", job_id, request.input, self.store.name());

        // The scratch directory is removed when it drops, on success or failure
        let scratch = tempfile::Builder::new()
            .prefix("deck-translator-")
            .tempdir()
            .map_err(JobError::Scratch)?;
        let input_path = scratch.path().join(SCRATCH_INPUT);
        let output_path = scratch.path().join(SCRATCH_OUTPUT);

        self.store.fetch(&request.input, &input_path).await?;

        let translator = self.translator(request.source_language.as_deref(), request.target_language.as_deref());
        let multi_progress = MultiProgress::new();
        let report = self
            .translate_file_with(&translator, &input_path, &output_path, &multi_progress)
            .await?;

        let output_locator = self.output_locator(&request.input);
        let receipt = self.store.store(&output_path, &output_locator).await?;

        let elapsed = start_time.elapsed();
        info!("Job {} finished in {}: {}", job_id, Self::format_duration(elapsed), report.summary());

        Ok(JobReport {
            job_id,
            input: request.input,
            output: receipt,
            report,
            elapsed,
        })
    }

    /// Read an S3 notification from a file and run the job it names
    pub async fn run_event(&self, event_file: &Path) -> Result<JobReport> {
        let event_json = std::fs::read_to_string(event_file)
            .context(format!("Failed to read event file: {}", event_file.display()))?;
        let request = JobRequest::from_s3_event(&event_json)?;
        Ok(self.run_job(request).await?)
    }

    /// Translate free text, one output per input
    pub async fn translate_texts(&self, texts: &[String]) -> Vec<Result<String, TranslationError>> {
        self.client
            .translate_batch(
                texts,
                &self.config.source_language,
                &self.config.target_language,
                &self.config.translation.options(),
            )
            .await
    }

    /// Check credentials and model access with the configured languages
    pub async fn check_connection(&self) -> Result<(), ProviderError> {
        self.client
            .test_connection(&self.config.source_language, &self.config.target_language)
            .await
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
