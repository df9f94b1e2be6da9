mod backend;
mod cli;
mod logging;
mod model;
mod orchestrator;
mod session;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let log_path = args.log_file.clone().or_else(logging::default_log_path);
    let log_init = match (args.is_interactive() && cfg!(feature = "tui"), log_path.as_deref()) {
        (true, Some(path)) => logging::init(logging::LogTarget::File(path), args.verbose),
        (true, None) => Ok(()),
        (false, _) => logging::init(logging::LogTarget::Stderr, args.verbose),
    };
    if let Err(e) = log_init {
        eprintln!("Logging disabled: {e:#}");
    }

    match cli::run(args).await? {
        // Non-interactive runs that end in error exit non-zero.
        model::RunStatus::Error => std::process::exit(1),
        _ => Ok(()),
    }
}
