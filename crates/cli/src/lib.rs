use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use reftest_converter::{ConversionStats, Converter, ConverterConfig, CorpusLayout, TreeWalker};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod record_parser;
mod snapshot;

pub use record_parser::FrontmatterParser;
pub use snapshot::{copy_license, recreate_dir, StashedDirs};

/// Print `text` as one line on stdout; a closed pipe ends output silently.
fn emit_line(text: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    match writeln!(out, "{text}").and_then(|()| out.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        written => written.context("write to stdout"),
    }
}

#[derive(Parser)]
#[command(name = "test262-import")]
#[command(about = "Import the test262 suite into the jstests harness", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the output tree from a test262 checkout (keeps `local/` and `prs/`)
    Update(ConvertArgs),

    /// Convert a test262 checkout into an output tree without clearing it first
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// test262 checkout (contains `test/` and `harness/`)
    #[arg(long)]
    src: PathBuf,

    /// Output directory
    #[arg(long, default_value = "test262")]
    out: PathBuf,

    /// Generate additional strict mode tests
    #[arg(long)]
    strict: bool,

    /// Directory holding local includes such as test262-host.js
    #[arg(long, default_value = ".")]
    local_includes: PathBuf,

    /// TOML file overriding the feature lists and include placement
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print run statistics as JSON on stdout
    #[arg(long)]
    json: bool,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let (args, rebuild) = match cli.command {
        Commands::Update(args) => (args, true),
        Commands::Convert(args) => (args, false),
    };
    let stats = run_import(&args, rebuild)?;

    if args.json {
        emit_line(&serde_json::to_string_pretty(&stats)?)?;
    }
    Ok(())
}

fn load_config(args: &ConvertArgs) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => ConverterConfig::load(path)
            .with_context(|| format!("load config: {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    if args.strict {
        config.strict_tests = true;
    }
    Ok(config)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(env::current_dir()
        .context("resolve current directory")?
        .join(path))
}

fn run_import(args: &ConvertArgs, rebuild: bool) -> Result<ConversionStats> {
    let config = load_config(args)?;
    let out_dir = absolute(&args.out)?;
    let reserved = config.reserved_dirs.clone();
    let converter = Converter::new(FrontmatterParser, config)?;

    let stashed = if rebuild {
        let stashed = StashedDirs::take(&out_dir, &reserved)?;
        let prepared = recreate_dir(&out_dir).and_then(|()| copy_license(&args.src, &out_dir));
        if let Err(err) = prepared {
            stashed.restore(&out_dir)?;
            return Err(err);
        }
        Some(stashed)
    } else {
        None
    };

    let result = TreeWalker::new(&converter, CorpusLayout::from_root(&args.src), &out_dir)
        .with_local_include_dir(&args.local_includes)
        .run();

    // Restore even when the conversion aborted; the stash is deleted on drop.
    if let Some(stashed) = stashed {
        stashed.restore(&out_dir)?;
    }
    result.with_context(|| format!("convert {}", args.src.display()))
}
