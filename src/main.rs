//! wavefarm - batch synthesizer-preset renderer.

mod batch;
mod cli;
mod discover;
mod error;
mod logging;
mod synth;
mod wav;

use anyhow::Result;
use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stderr};
use tracing::Level;

use batch::BatchConfig;
use batch::report::BatchOutcome;
use cli::{Cli, Commands, RenderArgs};

/// Exit status for a batch that ran to completion with failed workers.
const EXIT_COMPLETED_WITH_FAILURES: i32 = 2;

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Render(args) => cmd_render(&cli, args),
        Commands::Completions(args) => {
            args.generate();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!(
            "{}: {}",
            "error"
                .if_supports_color(Stderr, |text| text.red())
                .if_supports_color(Stderr, |text| text.bold()),
            e
        );
        for cause in e.chain().skip(1) {
            eprintln!(
                "  {}: {}",
                "caused by".if_supports_color(Stderr, |text| text.yellow()),
                cause
            );
        }
        std::process::exit(1);
    }
}

/// Resolve the effective log level from `-v` flags and `--log-level`.
fn resolve_level(cli: &Cli, log_level: &str) -> Level {
    match cli.verbose {
        0 => {
            if cli.quiet {
                Level::ERROR
            } else {
                logging::parse_level(log_level).unwrap_or(Level::INFO)
            }
        }
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn cmd_render(cli: &Cli, args: &RenderArgs) -> Result<()> {
    args.validate()?;

    logging::init(
        logging::LogConfig::new()
            .with_level(resolve_level(cli, &args.log_level))
            .with_env_overrides(),
    );

    // Worker mode: serve render requests over stdin/stdout (never returns)
    if args.internal_worker {
        batch::worker::run_worker_main(args.worker_id, &args.settings());
    }

    let config = BatchConfig {
        preset_dir: args.preset_dir.clone(),
        settings: args.settings(),
        worker_count: args.workers,
        show_progress: !cli.quiet,
        log_level: args.log_level.clone(),
    };

    let report = batch::run_batch(&config)?;

    if report.outcome() == BatchOutcome::CompletedWithFailures {
        // Distinct from the error path: the batch itself ran to completion
        std::process::exit(EXIT_COMPLETED_WITH_FAILURES);
    }

    Ok(())
}
