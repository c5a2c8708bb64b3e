//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use leafdex_core::{JsonFileWriter, ProgressSink};
use leafdex_discovery::DiscoveryOptions;
use leafdex_provider::{DocumentProvider, HttpProvider};
use leafdex_shared::{AppConfig, RunConfig, init_config, load_config};
use leafdex_text::{Dictionary, TextPipeline};
use tracing::info;

use crate::progress::CliProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// leafdex — scrape a medicines A–Z site into one structured JSON document.
#[derive(Parser)]
#[command(
    name = "leafdex",
    version,
    about = "Build a structured medicines dataset from a public leaflet site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover the catalog and extract every item into a JSON result.
    Run {
        #[command(flatten)]
        site: SiteArgs,

        /// Maximum number of items extracted at once.
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Delay each task waits after releasing its slot, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Only process the first N catalog entries.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output file for the result document.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Word list used for text repair.
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },

    /// Discover and print the catalog without extracting items.
    Catalog {
        #[command(flatten)]
        site: SiteArgs,

        /// Print the catalog as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by every command that touches the site.
#[derive(Args, Debug, Default)]
pub(crate) struct SiteArgs {
    /// Catalog index page URL.
    #[arg(long)]
    pub index_url: Option<String>,

    /// Per-navigation timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// CLI overrides applied on top of the config file.
#[derive(Debug, Default)]
struct Overrides {
    site: SiteArgs,
    concurrency: Option<usize>,
    delay_ms: Option<u64>,
    limit: Option<usize>,
    out: Option<PathBuf>,
    dictionary: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(url) = self.site.index_url {
            config.site.index_url = url;
        }
        if let Some(secs) = self.site.timeout_secs {
            config.run.timeout_secs = secs;
        }
        if let Some(n) = self.concurrency {
            config.run.concurrency = n;
        }
        if let Some(ms) = self.delay_ms {
            config.run.delay_ms = ms;
        }
        if self.limit.is_some() {
            config.run.limit = self.limit;
        }
        if let Some(out) = self.out {
            config.run.output = out.to_string_lossy().into_owned();
        }
        if let Some(dict) = self.dictionary {
            config.text.dictionary_path = dict.to_string_lossy().into_owned();
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leafdex=info",
        1 => "leafdex=debug",
        _ => "leafdex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            site,
            concurrency,
            delay_ms,
            limit,
            out,
            dictionary,
        } => {
            let overrides = Overrides {
                site,
                concurrency,
                delay_ms,
                limit,
                out,
                dictionary,
            };
            cmd_run(overrides).await
        }
        Command::Catalog { site, json } => {
            let overrides = Overrides {
                site,
                ..Overrides::default()
            };
            cmd_catalog(overrides, json).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Load the config file and layer CLI flags on top.
fn resolve_config(overrides: Overrides) -> Result<RunConfig> {
    let mut config = load_config()?;
    overrides.apply(&mut config);
    Ok(RunConfig::try_from(&config)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(overrides: Overrides) -> Result<()> {
    let config = resolve_config(overrides)?;

    info!(
        index = %config.index_url,
        concurrency = config.concurrency,
        delay_ms = config.delay.as_millis() as u64,
        limit = ?config.limit,
        "starting run"
    );

    // Engine start-up failure is fatal before discovery.
    let provider: Arc<dyn DocumentProvider> = Arc::new(HttpProvider::new()?);
    let dictionary = Dictionary::load_or_builtin(&config.dictionary_path);
    info!(words = dictionary.len(), source = ?dictionary.source(), "dictionary ready");
    let text = TextPipeline::new(dictionary);

    let sink: Arc<dyn ProgressSink> = Arc::new(CliProgress::new());
    let writer = JsonFileWriter::new(&config.output);

    let started = std::time::Instant::now();
    let result = leafdex_core::run(&config, provider, text, sink, &writer).await?;

    // Print summary
    println!();
    println!("  Run complete!");
    println!("  Found:     {}", result.total_found);
    println!("  Succeeded: {}", result.succeeded);
    println!("  Failed:    {}", result.failed_names.len());
    for name in &result.failed_names {
        println!("    - {name}");
    }
    println!("  Output:    {}", writer.path().display());
    println!("  Time:      {:.1}s", started.elapsed().as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_catalog(overrides: Overrides, json: bool) -> Result<()> {
    let config = resolve_config(overrides)?;
    let provider = HttpProvider::new()?;

    let links = leafdex_discovery::discover(&provider, &DiscoveryOptions::from(&config)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }

    let width = links
        .iter()
        .map(|l| l.label().chars().count())
        .max()
        .unwrap_or(0)
        .min(60);
    for link in &links {
        let name = link.name.as_deref().unwrap_or("(unnamed)");
        println!("  {name:<width$}  {}", link.url);
    }
    println!();
    println!("  {} items found at {}", links.len(), config.index_url);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    RunConfig::try_from(&config).map_err(|e| eyre!("config is not usable: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
