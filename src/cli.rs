use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::classify::PolicyKind;
use crate::form::{parse_field, FormSubmission};
use crate::render::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "narrator-stream")]
#[command(version)]
#[command(about = "Start a Black Stories game and render its streamed transcript in the terminal")]
pub struct Args {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Base URL of the game server
    #[arg(long)]
    pub url: Option<String>,

    /// Line classification policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Abort when no data arrives for this many seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Log filter, e.g. "debug" or "narrator_stream=trace"; RUST_LOG wins when set
    #[arg(long)]
    pub log: Option<String>,

    /// Game difficulty
    #[arg(long)]
    pub difficulty: Option<String>,

    /// Model playing the narrator
    #[arg(long)]
    pub narrator_model: Option<String>,

    /// Model playing the detective
    #[arg(long)]
    pub detective_model: Option<String>,

    /// Extra form field as key=value (repeatable)
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Save the conversation automatically when the server offers it
    #[arg(long)]
    pub save: bool,

    /// Never ask whether to save
    #[arg(long, conflicts_with = "save")]
    pub no_prompt: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Args {
    /// Collect the form: named options first, then `--field` pairs, so an
    /// explicit `--field difficulty=...` overrides `--difficulty`.
    pub fn form(&self) -> FormSubmission {
        let named = [
            ("difficulty", &self.difficulty),
            ("narrator_model", &self.narrator_model),
            ("detective_model", &self.detective_model),
        ];
        let pairs = named
            .into_iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())))
            .chain(self.fields.iter().cloned());
        FormSubmission::from_pairs(pairs)
    }
}
