//! brandpulse CLI - Command-line interface for the brandpulse engine
//!
//! Commands:
//! - analyze: Build a session for one brand and print its report
//! - aggregate: Correlate every mapped brand and print the ranked table
//! - brand: Run one brand's pipeline
//! - validate: Ingest an activity file and summarize it
//! - brands: Print the brand → ticker mapping

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use brandpulse::schema::{read_stock_file, ActivitySummary};
use brandpulse::{
    aggregate, analyze_brand, ActivityReader, AnalysisConfig, AnalysisError, BrandOutcome,
    BrandTicker, EmbeddingTable, ReportEncoder, ReportFormat, SessionBuilder, PRODUCER_NAME,
    VERSION,
};

/// brandpulse - Brand sentiment vs. stock volatility correlation engine
#[derive(Parser)]
#[command(name = "brandpulse")]
#[command(version = VERSION)]
#[command(about = "Correlate community sentiment with stock volatility", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Analysis configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a session for one brand and print its report
    Analyze {
        /// Active brand (community identifier)
        #[arg(short, long)]
        brand: String,

        /// Activity table (delimited text)
        #[arg(short, long)]
        activity: PathBuf,

        /// Stock CSV of the active brand; defaults to <finance-dir>/<TICKER>.csv
        #[arg(long)]
        stock: Option<PathBuf>,

        /// Additional communities whose activity counts toward the brand
        #[arg(long = "community")]
        communities: Vec<String>,

        /// Community embeddings (headerless CSV); enables aggregation
        #[arg(long)]
        embeddings: Option<PathBuf>,

        /// Directory of <TICKER>.csv stock files; enables aggregation
        #[arg(long)]
        finance_dir: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Correlate every mapped brand and print the ranked table
    Aggregate {
        /// Activity table (delimited text)
        #[arg(short, long)]
        activity: PathBuf,

        /// Community embeddings (headerless CSV)
        #[arg(long)]
        embeddings: PathBuf,

        /// Directory of <TICKER>.csv stock files
        #[arg(long)]
        finance_dir: PathBuf,

        /// Run brands in parallel
        #[arg(long)]
        parallel: bool,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Run one brand's pipeline
    Brand {
        /// Brand (community identifier)
        #[arg(short, long)]
        brand: String,

        /// Ticker; defaults to the configured mapping
        #[arg(short, long)]
        ticker: Option<String>,

        /// Activity table (delimited text)
        #[arg(short, long)]
        activity: PathBuf,

        /// Community embeddings (headerless CSV)
        #[arg(long)]
        embeddings: PathBuf,

        /// Directory of <TICKER>.csv stock files
        #[arg(long)]
        finance_dir: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Ingest an activity file and summarize it
    Validate {
        /// Activity table (delimited text)
        #[arg(short, long)]
        activity: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the brand → ticker mapping
    Brands {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// CSV table
    Csv,
    /// Markdown summary
    Markdown,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::JsonPretty => ReportFormat::JsonPretty,
            OutputFormat::Csv => ReportFormat::Csv,
            OutputFormat::Markdown => ReportFormat::Markdown,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BrandpulseCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            brand,
            activity,
            stock,
            communities,
            embeddings,
            finance_dir,
            output,
            format,
        } => cmd_analyze(
            &config,
            &brand,
            &activity,
            stock.as_deref(),
            communities,
            embeddings.as_deref(),
            finance_dir.as_deref(),
            &output,
            format,
        ),

        Commands::Aggregate {
            activity,
            embeddings,
            finance_dir,
            parallel,
            output,
            format,
        } => {
            let config = AnalysisConfig {
                parallel: parallel || config.parallel,
                ..config
            };
            cmd_aggregate(&config, &activity, &embeddings, &finance_dir, &output, format)
        }

        Commands::Brand {
            brand,
            ticker,
            activity,
            embeddings,
            finance_dir,
            output,
            format,
        } => cmd_brand(
            &config,
            &brand,
            ticker,
            &activity,
            &embeddings,
            &finance_dir,
            &output,
            format,
        ),

        Commands::Validate { activity, json } => cmd_validate(&config, &activity, json),

        Commands::Brands { json } => cmd_brands(&config, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, BrandpulseCliError> {
    match path {
        Some(path) => AnalysisConfig::from_file(path).map_err(BrandpulseCliError::Config),
        None => Ok(AnalysisConfig::default()),
    }
}

fn read_activity(
    config: &AnalysisConfig,
    path: &Path,
) -> Result<brandpulse::types::ActivityTable, BrandpulseCliError> {
    let table = ActivityReader::with_delimiter(config.delimiter)?.read_path(path)?;
    tracing::debug!(records = table.len(), path = %path.display(), "activity loaded");
    Ok(table)
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    config: &AnalysisConfig,
    brand: &str,
    activity: &Path,
    stock: Option<&Path>,
    communities: Vec<String>,
    embeddings: Option<&Path>,
    finance_dir: Option<&Path>,
    output: &Path,
    format: OutputFormat,
) -> Result<(), BrandpulseCliError> {
    let activity = read_activity(config, activity)?;

    let stock_rows = match (stock, finance_dir, config.ticker_for(brand)) {
        (Some(path), _, _) => read_stock_file(path)?,
        (None, Some(dir), Some(ticker)) => {
            let path = dir.join(format!("{}.csv", ticker));
            if path.is_file() {
                read_stock_file(&path)?
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    let embeddings = embeddings.map(EmbeddingTable::read_path).transpose()?;

    let mut brands = vec![brand.to_string()];
    brands.extend(communities);

    let mut builder = SessionBuilder::new(activity, stock_rows, brands, brand);
    if let Some(embeddings) = embeddings.as_ref() {
        builder = builder.with_embeddings(embeddings);
    }
    if let Some(dir) = finance_dir {
        builder = builder.with_finance_path(dir);
    }
    let session = builder.build(config);

    let rendered = ReportEncoder::new().encode_session(&session, format.into())?;
    write_output(output, &rendered)
}

fn cmd_aggregate(
    config: &AnalysisConfig,
    activity: &Path,
    embeddings: &Path,
    finance_dir: &Path,
    output: &Path,
    format: OutputFormat,
) -> Result<(), BrandpulseCliError> {
    let activity = read_activity(config, activity)?;
    let embeddings = EmbeddingTable::read_path(embeddings)?;

    let report = aggregate(&config.brands, &embeddings, &activity, finance_dir, config);

    let rendered = ReportEncoder::new().encode_aggregation(&report, format.into())?;
    write_output(output, &rendered)
}

#[allow(clippy::too_many_arguments)]
fn cmd_brand(
    config: &AnalysisConfig,
    brand: &str,
    ticker: Option<String>,
    activity: &Path,
    embeddings: &Path,
    finance_dir: &Path,
    output: &Path,
    format: OutputFormat,
) -> Result<(), BrandpulseCliError> {
    let ticker = ticker
        .or_else(|| config.ticker_for(brand).map(str::to_string))
        .ok_or_else(|| BrandpulseCliError::UnknownBrand(brand.to_string()))?;

    let activity = read_activity(config, activity)?;
    let embeddings = EmbeddingTable::read_path(embeddings)?;

    let outcome = analyze_brand(
        &BrandTicker::new(brand, ticker),
        &embeddings,
        &activity,
        finance_dir,
        config,
    );

    let rendered = ReportEncoder::new().encode_brand(&outcome, format.into())?;
    write_output(output, &rendered)?;

    match outcome {
        BrandOutcome::Analyzed(_) => Ok(()),
        BrandOutcome::Skipped(skip) => Err(BrandpulseCliError::Skipped(skip.reason.to_string())),
    }
}

fn cmd_validate(
    config: &AnalysisConfig,
    activity: &Path,
    json: bool,
) -> Result<(), BrandpulseCliError> {
    let table = read_activity(config, activity)?;
    let summary = ActivitySummary::of(&table);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} {} activity summary", PRODUCER_NAME, VERSION);
        println!("  records:         {}", summary.records);
        println!("  communities:     {}", summary.communities);
        println!("  negative links:  {}", summary.negative_links);
        println!("  feature columns: {}", summary.feature_columns);
        if let (Some(first), Some(last)) = (summary.first_timestamp, summary.last_timestamp) {
            println!("  time span:       {} .. {}", first.to_rfc3339(), last.to_rfc3339());
        }
    }

    if summary.records == 0 {
        return Err(BrandpulseCliError::NoActivity);
    }
    Ok(())
}

fn cmd_brands(config: &AnalysisConfig, json: bool) -> Result<(), BrandpulseCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.brands)?);
    } else {
        for entry in &config.brands {
            println!("{:<12} {}", entry.brand, entry.ticker);
        }
    }
    Ok(())
}

fn write_output(output: &Path, data: &str) -> Result<(), BrandpulseCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

#[derive(Debug)]
enum BrandpulseCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Config(AnalysisError),
    Json(serde_json::Error),
    UnknownBrand(String),
    Skipped(String),
    NoActivity,
}

impl From<io::Error> for BrandpulseCliError {
    fn from(e: io::Error) -> Self {
        BrandpulseCliError::Io(e)
    }
}

impl From<AnalysisError> for BrandpulseCliError {
    fn from(e: AnalysisError) -> Self {
        BrandpulseCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for BrandpulseCliError {
    fn from(e: serde_json::Error) -> Self {
        BrandpulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BrandpulseCliError> for CliError {
    fn from(e: BrandpulseCliError) -> Self {
        match e {
            BrandpulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BrandpulseCliError::Analysis(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'brandpulse validate' on the activity file".to_string()),
            },
            BrandpulseCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the configuration JSON".to_string()),
            },
            BrandpulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            BrandpulseCliError::UnknownBrand(brand) => CliError {
                code: "UNKNOWN_BRAND".to_string(),
                message: format!("No ticker mapped to brand '{}'", brand),
                hint: Some("Pass --ticker or run 'brandpulse brands'".to_string()),
            },
            BrandpulseCliError::Skipped(reason) => CliError {
                code: "BRAND_SKIPPED".to_string(),
                message: format!("Brand skipped: {}", reason),
                hint: None,
            },
            BrandpulseCliError::NoActivity => CliError {
                code: "NO_ACTIVITY".to_string(),
                message: "No activity records found in input".to_string(),
                hint: Some("Ensure the file has a header and the right delimiter".to_string()),
            },
        }
    }
}
