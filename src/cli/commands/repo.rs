//! The `kable repo` command.

use std::io::Write;

use crate::cli::args::{RepoAddArgs, RepoArgs, RepoCommands};
use crate::error::Result;
use crate::kable::Kable;
use crate::repositories::SourceDescriptor;

use super::dispatcher::{Command, CommandResult, Output};

/// Adds and lists registered repositories.
pub struct RepoCommand {
    kable: Kable,
    args: RepoArgs,
}

impl RepoCommand {
    pub fn new(kable: Kable, args: RepoArgs) -> Self {
        Self { kable, args }
    }

    fn add(&self, args: &RepoAddArgs, output: &mut Output<'_>) -> Result<CommandResult> {
        let mut source = SourceDescriptor::new(&args.name, &args.url)
            .with_ref(args.git_ref.clone().unwrap_or_default());
        if args.username.is_some() || args.password.is_some() {
            source = source.with_auth(
                args.username.clone().unwrap_or_default(),
                args.password.clone().unwrap_or_default(),
            );
        }

        self.kable.registry().apply(source.modifications()?)?;
        output.status(&format!("Added repository '{}' ({})", source.name, source.url))?;
        Ok(CommandResult::success())
    }

    fn list(&self, output: &mut Output<'_>) -> Result<CommandResult> {
        let registry = self.kable.registry();
        let sources = registry.sources();
        if sources.is_empty() {
            output.status("No repositories registered")?;
            return Ok(CommandResult::success());
        }

        for (name, entry) in sources {
            let auth = if registry.credentials_for(&entry.url).is_some() {
                " (auth)"
            } else {
                ""
            };
            writeln!(
                output.out,
                "{}\t{}\t{}{}",
                name,
                entry.url,
                entry.git_ref.as_deref().unwrap_or("-"),
                auth
            )?;
        }
        Ok(CommandResult::success())
    }
}

impl Command for RepoCommand {
    fn execute(&self, output: &mut Output<'_>) -> Result<CommandResult> {
        match &self.args.command {
            RepoCommands::Add(args) => self.add(args, output),
            RepoCommands::List => self.list(output),
        }
    }
}
