// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::{BufRead, Write};
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use deck_translator::app_config::{self, Config, TranslationProvider};
use deck_translator::app_controller::{Controller, JobRequest};
use deck_translator::file_utils::FileManager;
use deck_translator::storage::Locator;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Bedrock,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Bedrock => TranslationProvider::Bedrock,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command that talks to the model
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model identifier to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language (free text, e.g. 'auto (en-US)')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language (e.g. 'zh-TW', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Enable extended reasoning
    #[arg(long)]
    reasoning: bool,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write a JSON report of per-unit outcomes
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a local deck or every deck in a directory
    Translate {
        /// Input .pptx file or directory to process
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Output file (single-file mode only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Translate a deck stored in object storage
    Job {
        /// Bucket holding the deck
        #[arg(short, long)]
        bucket: String,

        /// Object key of the deck
        #[arg(short, long)]
        key: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the job described by an S3 event notification file
    Event {
        /// Event JSON file
        #[arg(value_name = "EVENT_FILE")]
        event_file: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Translate text arguments, or stdin lines when none are given
    Text {
        /// Text to translate
        #[arg(value_name = "TEXT")]
        texts: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Send a short request to check credentials and model access
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for deck-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// deck-translator - Structure-preserving translation of slide decks
///
/// Translates every text frame, table cell and speaker note of a .pptx deck
/// with a hosted language model while keeping layout and formatting.
#[derive(Parser, Debug)]
#[command(name = "deck-translator")]
#[command(version)]
#[command(about = "Structure-preserving PPTX translation with AI")]
#[command(long_about = "deck-translator translates PowerPoint decks in place using hosted language models.

EXAMPLES:
    deck-translator translate deck.pptx                    # Translate using default config
    deck-translator translate -f deck.pptx                 # Force overwrite existing output
    deck-translator translate -t es -o out.pptx deck.pptx  # Translate to Spanish into out.pptx
    deck-translator translate --reasoning /decks/          # Process entire directory with reasoning
    deck-translator job -b uploads -k q3/review.pptx       # Translate an object from S3
    deck-translator event event.json                       # Run the job named by an S3 event
    deck-translator text -t fr 'Quarterly results'         # Translate a single string
    deck-translator completions bash > deck-translator.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    bedrock   - AWS Bedrock Converse API (default credential chain)
    anthropic - Anthropic Messages API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself accepts everything; `set_max_level` does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "31",
            Level::Warn => "33",
            Level::Info => "32",
            Level::Debug => "36",
            Level::Trace => "35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[1;{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "deck-translator", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate { input_path, output, force_overwrite, common } => {
            let controller = build_controller(&common).await?;
            run_translate(&controller, input_path, output, force_overwrite, common.report.as_deref()).await
        }
        Commands::Job { bucket, key, common } => {
            let controller = build_controller(&common).await?;
            let report = controller.run_job(JobRequest::new(Locator::new(bucket, key))).await?;
            info!("Uploaded {} ({} bytes)", report.output.locator, report.output.bytes);
            write_report(common.report.as_deref(), &report)
        }
        Commands::Event { event_file, common } => {
            let controller = build_controller(&common).await?;
            let report = controller.run_event(&event_file).await?;
            info!("Uploaded {} ({} bytes)", report.output.locator, report.output.bytes);
            write_report(common.report.as_deref(), &report)
        }
        Commands::Text { texts, common } => {
            let controller = build_controller(&common).await?;
            run_text(&controller, texts).await
        }
        Commands::Check { common } => {
            let controller = build_controller(&common).await?;
            controller
                .check_connection()
                .await
                .context("Connection check failed")?;
            info!("✅ {} - {} is reachable", controller.client().provider_name(), controller.client().model_id());
            Ok(())
        }
    }
}

// Load the config (or create a default one), apply CLI overrides, set the log level
fn load_config(options: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.model_id = model.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if options.reasoning {
        config.translation.use_reasoning = true;
    }
    if let Some(temperature) = options.temperature {
        config.translation.temperature = temperature;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

async fn build_controller(options: &CommonArgs) -> Result<Controller> {
    let config = load_config(options)?;
    info!("{} → {} with {} ({})",
        config.source_language,
        config.target_language,
        config.translation.provider.display_name(),
        config.translation.model_id);
    Controller::with_config(config).await
}

async fn run_translate(
    controller: &Controller,
    input_path: PathBuf,
    output: Option<PathBuf>,
    force_overwrite: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    if input_path.is_file() {
        if let Some(report) = controller.run(input_path, output, force_overwrite).await? {
            write_report(report_path, &report)?;
        }
    } else if input_path.is_dir() {
        if output.is_some() {
            warn!("--output is ignored in folder mode");
        }
        let summary = controller.run_folder(input_path, force_overwrite).await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} file(s) failed to translate", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

async fn run_text(controller: &Controller, texts: Vec<String>) -> Result<()> {
    let texts = if texts.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to read stdin")?
    } else {
        texts
    };

    let mut failures = 0;
    let mut stdout = std::io::stdout();
    for result in controller.translate_texts(&texts).await {
        match result {
            Ok(translated) => writeln!(stdout, "{}", translated)?,
            Err(e) => {
                error!("{}", e);
                failures += 1;
                writeln!(stdout)?;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} text(s) failed to translate", failures));
    }
    Ok(())
}

fn write_report<T: serde::Serialize>(path: Option<&Path>, report: &T) -> Result<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(report)
            .context("Failed to serialize report")?;
        FileManager::write_to_file(path, &json)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
