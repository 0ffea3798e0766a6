use anyhow::Result;
use bibpage::config::Config;
use bibpage::pipeline;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "bibpage")]
#[command(about = "Convert a BibTeX export into an HTML publication list")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the bibliography into an HTML fragment
    Render(RenderArgs),
    /// Print the parsed, deduplicated entries as JSON
    Inspect(InspectArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Path to the BibTeX file
    #[arg(short, long)]
    input: PathBuf,

    /// Path of the HTML fragment to write
    #[arg(short, long)]
    output: PathBuf,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dry run - parse and render but don't write the output file
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Path to the BibTeX file
    #[arg(short, long)]
    input: PathBuf,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn run_render(args: RenderArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;

    let start = Instant::now();
    let stats = pipeline::run(&args.input, &args.output, &config, args.dry_run)?;
    let duration = start.elapsed();
    info!(duration_secs = duration.as_secs_f64(), "Render complete");

    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.3}s", duration.as_secs_f64());
    println!();
    println!("Entries parsed:     {}", stats.entries_parsed);
    println!("String macros:      {}", stats.macros_defined);
    println!("Malformed blocks:   {}", stats.malformed_blocks);
    println!("Duplicates removed: {}", stats.duplicates_dropped);
    println!("Entries kept:       {}", stats.kept());
    println!("Undated entries:    {}", stats.undated_entries);
    println!("Top journals:       {}", stats.top_journals);
    println!("Top conferences:    {}", stats.top_conferences);
    println!("Rendered entries:   {}", stats.rendered_entries);
    if args.dry_run {
        println!("Output:             (dry run, nothing written)");
    } else {
        println!("Output:             {}", args.output.display());
    }

    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let text = pipeline::read_input(&args.input)?;
    println!("{}", pipeline::inspect_str(&text, &config)?);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let result = match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
