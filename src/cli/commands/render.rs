//! The `kable render` and `kable render-local` commands.

use std::io::Write;

use crate::cli::args::{RenderArgs, RenderLocalArgs};
use crate::error::Result;
use crate::kable::{Kable, RenderRequest};
use crate::render::{RenderOptions, RenderedOutput};

use super::dispatcher::{Command, CommandResult, Output};

/// Renders a concept from a registered repository.
pub struct RenderCommand {
    kable: Kable,
    args: RenderArgs,
}

impl RenderCommand {
    pub fn new(kable: Kable, args: RenderArgs) -> Self {
        Self { kable, args }
    }

    fn request(&self) -> RenderRequest {
        let mut repositories = self.args.repos.clone();
        if let Some(last) = repositories.pop() {
            let last = match (&self.args.username, &self.args.password) {
                (None, None) => last,
                (username, password) => last.with_auth(
                    username.clone().unwrap_or_default(),
                    password.clone().unwrap_or_default(),
                ),
            };
            repositories.push(last);
        }

        RenderRequest {
            identifier: self.args.identifier.clone(),
            inputs: self.args.inputs.clone(),
            sensitive_inputs: self.args.sensitive.clone(),
            target: self.args.target.clone(),
            repositories,
            options: RenderOptions {
                local: false,
                single: !self.args.split,
                write_render_info: self.args.render_info,
            },
        }
    }
}

impl Command for RenderCommand {
    fn execute(&self, output: &mut Output<'_>) -> Result<CommandResult> {
        let rendered = self.kable.render_concept(&self.request())?;
        emit(&rendered, output)?;
        Ok(CommandResult::success())
    }
}

/// Renders a concept from a local directory.
pub struct RenderLocalCommand {
    kable: Kable,
    args: RenderLocalArgs,
}

impl RenderLocalCommand {
    pub fn new(kable: Kable, args: RenderLocalArgs) -> Self {
        Self { kable, args }
    }
}

impl Command for RenderLocalCommand {
    fn execute(&self, output: &mut Output<'_>) -> Result<CommandResult> {
        let rendered = self.kable.render_local_concept(
            &self.args.path,
            &self.args.inputs,
            &self.args.sensitive,
            &self.args.target,
        )?;
        emit(&rendered, output)?;
        Ok(CommandResult::success())
    }
}

fn emit(rendered: &RenderedOutput, output: &mut Output<'_>) -> Result<()> {
    output.out.write_all(rendered.print().as_bytes())?;
    output.out.flush()?;
    output.status(&format!("identity: {}", rendered.identity))
}
