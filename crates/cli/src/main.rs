mod echo;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use blinkpress_core::{Config, DocumentFormat, FailurePolicy, Item, Orchestrator};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use echo::{print_banner, print_info, print_report, print_step, print_timing};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Download Blinkist reader pages and assemble them into PDF or Markdown documents
#[derive(Parser, Debug)]
#[command(name = "blinkpress")]
#[command(author = "Blinkpress Contributors")]
#[command(version)]
#[command(about = "Turn Blinkist reader pages into PDF or Markdown documents", long_about = None)]
struct Args {
    /// Book identifiers to download (default: the books listed in the config file)
    #[arg(value_name = "BOOK")]
    books: Vec<String>,

    /// Configuration file (default: config/default.json, then the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for the finished documents
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Output format (pdf, markdown)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<DocumentFormat>,

    /// Reader language code
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,

    /// Maximum number of books processed at the same time
    #[arg(short = 'j', long, value_name = "NUM")]
    concurrency: Option<usize>,

    /// Cancel the remaining books after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Account e-mail address
    #[arg(short, long, env = "BLINKPRESS_USERNAME", value_name = "EMAIL")]
    username: Option<String>,

    /// Account password
    #[arg(long, env = "BLINKPRESS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Site root to download from
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,blinkpress_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Loads the config file and layers the command-line overrides on top.
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load config file: {}", path.display()))?
        }
        None => match Config::discover() {
            Ok(config) => config,
            Err(err) => match (&args.username, &args.password) {
                (Some(username), Some(password)) => Config::builder(username, password).build(),
                _ => return Err(err).context("Failed to load configuration"),
            },
        },
    };

    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if !args.books.is_empty() {
        config.books = args
            .books
            .iter()
            .map(|id| Item::new(id.as_str()))
            .collect::<Result<_, _>>()
            .context("Invalid book identifier")?;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(lang) = &args.lang {
        config.language = lang.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.fail_fast {
        config.failure_policy = FailurePolicy::CancelRemaining;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "blinkpress", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
        print_step(1, 3, "Loading configuration");
    }

    let config = load_config(&args)?;

    if config.books.is_empty() {
        anyhow::bail!("No books to download: list them in the config file or pass them as arguments");
    }

    if args.verbose {
        eprintln!("  {} {}", "Books:".dimmed(), config.books.len().to_string().bright_white());
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", config.format).bright_white());
        eprintln!("  {} {}", "Output:".dimmed(), config.output_dir.display().bright_white());
        eprintln!();
        print_step(2, 3, &format!("Logging in as {}", config.username.bright_white()));
    }

    let started = Instant::now();
    let orchestrator = Orchestrator::from_config(&config).context("Failed to set up the download")?;
    let report = orchestrator.run(&config.books).await.context("Login failed")?;

    if args.verbose {
        eprintln!();
        print_step(3, 3, "Summary");
    }

    print_report(&report);

    if args.verbose {
        print_timing("Elapsed", started.elapsed());
    }

    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
