//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::repositories::SourceDescriptor;

/// Kable - Render Kubernetes concepts from git-backed repositories.
#[derive(Debug, Parser)]
#[command(name = "kable")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Kable home directory (registry, checkouts, render info)
    #[arg(long, global = true, env = "KABLE_HOME")]
    pub home: Option<PathBuf>,

    /// Print rendered output only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a concept from a registered repository
    Render(RenderArgs),

    /// Render a concept from a local directory
    RenderLocal(RenderLocalArgs),

    /// Manage registered repositories
    Repo(RepoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `render` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RenderArgs {
    /// Concept to render, as `<path>@<repository>`
    pub identifier: String,

    /// Template input as name=value (repeatable)
    #[arg(short, long = "input", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub inputs: Vec<(String, String)>,

    /// Sensitive template input as name=value (repeatable)
    #[arg(short, long = "sensitive", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub sensitive: Vec<(String, String)>,

    /// Register a repository before rendering, as name=url[#ref] (repeatable)
    #[arg(long = "repo", value_name = "NAME=URL[#REF]", value_parser = parse_repo)]
    pub repos: Vec<SourceDescriptor>,

    /// Username for the last --repo
    #[arg(long, requires = "repos")]
    pub username: Option<String>,

    /// Password or token for the last --repo
    #[arg(long, requires = "repos")]
    pub password: Option<String>,

    /// Output format: yaml or json
    #[arg(short, long, default_value = "")]
    pub target: String,

    /// Keep documents separate instead of joining them into one
    #[arg(long)]
    pub split: bool,

    /// Write a render info record
    #[arg(long)]
    pub render_info: bool,
}

/// Arguments for the `render-local` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RenderLocalArgs {
    /// Directory containing concept.yaml
    pub path: PathBuf,

    /// Template input as name=value (repeatable)
    #[arg(short, long = "input", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub inputs: Vec<(String, String)>,

    /// Sensitive template input as name=value (repeatable)
    #[arg(short, long = "sensitive", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub sensitive: Vec<(String, String)>,

    /// Output format: yaml or json
    #[arg(short, long, default_value = "")]
    pub target: String,
}

/// Arguments for the `repo` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommands,
}

/// Repository subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum RepoCommands {
    /// Register or replace a repository
    Add(RepoAddArgs),

    /// List registered repositories
    List,
}

/// Arguments for `repo add`.
#[derive(Debug, Clone, clap::Args)]
pub struct RepoAddArgs {
    /// Repository name used in identifiers
    pub name: String,

    /// Git url
    pub url: String,

    /// Branch, tag or commit (defaults to the remote's default branch)
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Username for the repository
    #[arg(long)]
    pub username: Option<String>,

    /// Password or token for the repository
    #[arg(long, env = "KABLE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

fn parse_repo(s: &str) -> Result<SourceDescriptor, String> {
    let (name, rest) = s
        .split_once('=')
        .filter(|(name, rest)| !name.is_empty() && !rest.is_empty())
        .ok_or_else(|| format!("expected NAME=URL[#REF], got '{s}'"))?;

    let descriptor = match rest.rsplit_once('#') {
        Some((url, git_ref)) => SourceDescriptor::new(name, url).with_ref(git_ref),
        None => SourceDescriptor::new(name, rest),
    };
    Ok(descriptor)
}
