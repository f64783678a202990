use clap::Parser;
use regen::driver::Driver;
use regen::watch::SourceWatcher;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Live code generation from a template script over an indexed solution.
#[derive(Parser, Debug)]
#[command(name = "regen", version, about)]
struct Cli {
    /// Path to the template script.
    script: PathBuf,

    /// Keep running: watch the solution's sources and regenerate on change.
    #[arg(short, long)]
    watch: bool,

    /// Surface per-unit parse diagnostics and debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> regen::error::Result<()> {
    let driver = Driver::new(&cli.script, cli.verbose)?;

    // The first pass is strict: a broken script, manifest or solution load
    // must fail the process instead of silently generating nothing.
    driver.run_pass()?;

    if !cli.watch {
        return Ok(());
    }

    let roots: Vec<PathBuf> = {
        let state = driver.state().lock();
        state
            .solution()
            .map(|s| s.projects().iter().map(|p| p.root().to_path_buf()).collect())
            .unwrap_or_default()
    };
    if roots.is_empty() {
        error!("nothing to watch: the script declared no solution");
        return Ok(());
    }

    let watcher = SourceWatcher::new(&roots)?;
    watcher.run(&driver)
}
