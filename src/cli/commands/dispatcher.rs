//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::{load_config, resolve_home, KableConfig, KablePaths};
use crate::error::Result;
use crate::kable::Kable;

/// Where commands write.
///
/// Rendered text goes to `out`; status lines go to `err` and are dropped
/// when `quiet` is set.
pub struct Output<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub quiet: bool,
}

impl<'a> Output<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write, quiet: bool) -> Self {
        Self { out, err, quiet }
    }

    /// Write a status line unless quiet.
    pub fn status(&mut self, message: &str) -> Result<()> {
        if !self.quiet {
            writeln!(self.err, "{}", message)?;
        }
        Ok(())
    }
}

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, output: &mut Output<'_>) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    home: PathBuf,
}

impl CommandDispatcher {
    /// Create a dispatcher for the given home directory.
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// Dispatcher for the home named by `--home`, `KABLE_HOME` or `~/.kable`.
    pub fn for_cli(cli: &Cli) -> Self {
        Self::new(resolve_home(cli.home.as_deref()))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn open_kable(&self) -> Result<Kable> {
        let config: KableConfig = load_config(&self.home)?;
        let paths = KablePaths::new(&self.home, &config);
        tracing::debug!("Using kable home {}", paths.home.display());
        Kable::open(&paths, &config)
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, output: &mut Output<'_>) -> Result<CommandResult> {
        match &cli.command {
            Commands::Render(args) => {
                let cmd = super::render::RenderCommand::new(self.open_kable()?, args.clone());
                cmd.execute(output)
            }
            Commands::RenderLocal(args) => {
                let cmd =
                    super::render::RenderLocalCommand::new(self.open_kable()?, args.clone());
                cmd.execute(output)
            }
            Commands::Repo(args) => {
                let cmd = super::repo::RepoCommand::new(self.open_kable()?, args.clone());
                cmd.execute(output)
            }
            Commands::Completions(args) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(output)
            }
        }
    }
}
