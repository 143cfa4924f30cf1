//! Kable CLI entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use kable::cli::{Cli, CommandDispatcher, Output};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO, or WARN with `--quiet`
fn init_tracing(debug: bool, quiet: bool) {
    let filter = if debug {
        EnvFilter::new("kable=debug")
    } else {
        let default = if quiet { "kable=warn" } else { "kable=info" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.quiet);

    let dispatcher = CommandDispatcher::for_cli(&cli);
    tracing::debug!("Kable starting with home {}", dispatcher.home().display());

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let (mut out, mut err) = (stdout.lock(), stderr.lock());
    let mut output = Output::new(&mut out, &mut err, cli.quiet);

    match dispatcher.dispatch(&cli, &mut output) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            ExitCode::from(1)
        }
    }
}
