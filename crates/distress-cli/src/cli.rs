//! Command-line arguments.
//!
//! Priority resolution: flags > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use distress_core::validate::ValidationPolicy;

use crate::config::Overrides;

/// Distress analysis of patient transcripts with follow-up chat.
#[derive(Parser, Debug)]
#[command(name = "distress", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// AWS region for Bedrock.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Bedrock model or inference profile id.
    #[arg(long = "model-id", global = true)]
    pub model_id: Option<String>,

    /// Named AWS credentials profile.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Handling of analyses that break the rubric: trust, warn, reject or repair.
    #[arg(long, global = true)]
    pub validation: Option<ValidationPolicy>,
}

impl ModelArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            region: self.region.clone(),
            model_id: self.model_id.clone(),
            profile: self.profile.clone(),
            validation: self.validation,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session: the first message is analyzed, later ones are
    /// questions about the analysis.
    Chat {
        /// Submit this transcript file (text or .docx) as the first message.
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Continue a conversation saved with /save.
        #[arg(short, long, conflicts_with = "transcript")]
        resume: Option<PathBuf>,
    },

    /// Analyze a single transcript and print or export the report.
    Analyze {
        /// Transcript file (text or .docx). Use `-` for stdin.
        input: PathBuf,

        /// Print the raw analysis as JSON instead of the report.
        #[arg(long)]
        json: bool,

        /// Also write the report as PDF.
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Also write the report as DOCX.
        #[arg(long)]
        docx: Option<PathBuf>,

        /// Also write the report as Markdown.
        #[arg(long)]
        markdown: Option<PathBuf>,
    },

    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings and where they come from.
    Show,
    /// Write a config file from the current flags and defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
