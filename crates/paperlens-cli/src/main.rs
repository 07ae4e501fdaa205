use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use paperlens_core::config_file::{self, ConfigFile};
use paperlens_core::{Analyzer, OpenAiGenerator, PaperStore, TextGenerator};
use paperlens_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// PaperLens - Summarize AI/CS research papers and surface research gaps
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the paper database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// API key for the generation backend
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Chat model used for generation
    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text and metadata from a PDF and store the paper
    Add {
        /// Path to the PDF file
        pdf_path: PathBuf,
    },

    /// Print a stored paper's metadata and derived fields
    Show {
        /// Paper id as printed by `add` and `search`
        id: i64,

        /// Also print the stored full text
        #[arg(long)]
        full: bool,
    },

    /// Generate (or fetch the stored) summary and key findings
    Summarize {
        /// Paper id
        id: i64,
    },

    /// Analyze a paper for research gaps and future work
    Gaps {
        /// Paper id
        id: i64,
    },

    /// Compare two papers for gaps and synergies
    Compare {
        /// First paper id
        id1: i64,

        /// Second paper id
        id2: i64,
    },

    /// Search stored papers by keyword
    Search {
        /// Keyword matched against title, summary, and full text
        #[arg(default_value = "")]
        query: String,

        /// Research area matched against summaries only
        #[arg(long)]
        area: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_file::load_config();
    let db_path = resolve_db_path(cli.db, &config);
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Add { pdf_path } => add(&pdf_path, &db_path, color),
        Command::Show { id, full } => show(id, full, &db_path, color),
        Command::Summarize { id } => {
            let generator = build_generator(cli.api_key, cli.model, cli.base_url, &config)?;
            summarize(id, &db_path, &generator, color).await
        }
        Command::Gaps { id } => {
            let generator = build_generator(cli.api_key, cli.model, cli.base_url, &config)?;
            gaps(id, &db_path, &generator, color).await
        }
        Command::Compare { id1, id2 } => {
            let generator = build_generator(cli.api_key, cli.model, cli.base_url, &config)?;
            compare(id1, id2, &db_path, &generator, color).await
        }
        Command::Search { query, area } => search(&query, area.as_deref(), &db_path, color),
    }
}

/// CLI flag, then `PAPERLENS_DB`, then the config file, then the platform
/// data directory (falling back to the current directory).
fn resolve_db_path(flag: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    flag.or_else(|| std::env::var("PAPERLENS_DB").ok().map(PathBuf::from))
        .or_else(|| {
            config
                .storage
                .as_ref()
                .and_then(|s| s.db_path.clone())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("paperlens").join("papers.db"))
                .unwrap_or_else(|| PathBuf::from("papers.db"))
        })
}

/// Resolve generation settings (flags > env vars > config file) and build
/// the client. A missing api key is a startup error.
fn build_generator(
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    config: &ConfigFile,
) -> anyhow::Result<OpenAiGenerator> {
    let file_generator = config.generator.as_ref();

    let api_key = api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .or_else(|| file_generator.and_then(|g| g.api_key.clone()));
    let Some(api_key) = api_key else {
        anyhow::bail!("No API key configured. Pass --api-key or set OPENAI_API_KEY.");
    };

    let mut generator = OpenAiGenerator::new(api_key);
    if let Some(model) = model.or_else(|| file_generator.and_then(|g| g.model.clone())) {
        generator = generator.with_model(model);
    }
    if let Some(base_url) = base_url
        .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
        .or_else(|| file_generator.and_then(|g| g.base_url.clone()))
    {
        generator = generator.with_base_url(base_url);
    }
    if let Some(secs) = file_generator.and_then(|g| g.timeout_secs) {
        generator = generator.with_timeout(Duration::from_secs(secs));
    }
    Ok(generator)
}

fn add(pdf_path: &PathBuf, db_path: &PathBuf, color: ColorMode) -> anyhow::Result<()> {
    if !pdf_path.exists() {
        anyhow::bail!("File not found: {}", pdf_path.display());
    }
    let is_pdf = pdf_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        anyhow::bail!("Only PDF files are supported: {}", pdf_path.display());
    }

    let backend = MupdfBackend::new();
    let meta = paperlens_parsing::extract_from_pdf(pdf_path, &backend)?;

    let store = PaperStore::open(db_path)?;
    let id = store.insert(&meta, &pdf_path.display().to_string())?;

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_added(&mut writer, id, &meta, color)?;
    Ok(())
}

fn show(id: i64, full: bool, db_path: &PathBuf, color: ColorMode) -> anyhow::Result<()> {
    let store = PaperStore::open(db_path)?;
    let Some(paper) = store.get(id)? else {
        anyhow::bail!("Paper {} not found", id);
    };

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_paper(&mut writer, &paper, full, color)?;
    Ok(())
}

async fn summarize(
    id: i64,
    db_path: &PathBuf,
    generator: &dyn TextGenerator,
    color: ColorMode,
) -> anyhow::Result<()> {
    let store = PaperStore::open(db_path)?;
    let analyzer = Analyzer::new(&store, generator);
    let report = analyzer.summarize(id).await?;

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_summary_report(&mut writer, &report, color)?;
    Ok(())
}

async fn gaps(
    id: i64,
    db_path: &PathBuf,
    generator: &dyn TextGenerator,
    color: ColorMode,
) -> anyhow::Result<()> {
    let store = PaperStore::open(db_path)?;
    let analyzer = Analyzer::new(&store, generator);
    let report = analyzer.gaps(id).await?;

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_gaps_report(&mut writer, &report, color)?;
    Ok(())
}

async fn compare(
    id1: i64,
    id2: i64,
    db_path: &PathBuf,
    generator: &dyn TextGenerator,
    color: ColorMode,
) -> anyhow::Result<()> {
    let store = PaperStore::open(db_path)?;
    let analyzer = Analyzer::new(&store, generator);
    let comparison = analyzer.compare(id1, id2).await?;

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_comparison(&mut writer, id1, id2, &comparison, color)?;
    Ok(())
}

fn search(
    query: &str,
    area: Option<&str>,
    db_path: &PathBuf,
    color: ColorMode,
) -> anyhow::Result<()> {
    let store = PaperStore::open(db_path)?;
    let hits = store.search(query, area)?;

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_search_results(&mut writer, &hits, color)?;
    Ok(())
}
