//! Command-line interface wiring for problem-finder.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod annotate;
pub mod rules;
pub mod run;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Flag problem sentences in radiology reports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Run(args) => run::run(args, settings).await,
            Commands::Rules(args) => rules::run(args, settings).await,
            Commands::Annotate(args) => annotate::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract problem sentences from every report and write one file per problem.
    Run(run::Args),
    /// Validate the target rule file and list its rules.
    Rules(rules::Args),
    /// Annotate a single text and print the resulting rows as JSON.
    Annotate(annotate::Args),
}
