use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Quiz content desk: import questions, inspect template resolution, answer
/// and export questions.
#[derive(Parser)]
#[command(name = "quizdesk", version)]
pub struct Cli {
    /// JSON data file holding channels, questions and answers
    #[arg(short, long, global = true, default_value = "quizdesk.json")]
    pub data: PathBuf,

    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Who runs a command.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct UserArgs {
    /// User id; anonymous when omitted
    #[arg(long)]
    pub user: Option<String>,

    /// Roles granted to the user
    #[arg(long = "role")]
    pub roles: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import questions from a CSV file
    Import {
        file: PathBuf,
        #[command(flatten)]
        user: UserArgs,
    },

    /// Show the candidate template paths for a page
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },

    /// Show a question page as a visitor would get it
    Show {
        pretty_slug: String,
        #[command(flatten)]
        user: UserArgs,
    },

    /// Answer a question
    Answer {
        pretty_slug: String,
        /// Letter of the chosen answer
        #[arg(long)]
        choice: String,
        #[arg(long)]
        explanation: Option<String>,
        #[command(flatten)]
        user: UserArgs,
    },

    /// Export questions
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        /// Question ids; every question when omitted
        ids: Vec<u64>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        user: UserArgs,
    },

    /// List questions the way the admin shows them
    List {
        #[command(flatten)]
        user: UserArgs,
    },

    /// Change question fields, e.g. `--set title="Gold symbol"`
    Edit {
        id: u64,
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
        #[command(flatten)]
        user: UserArgs,
    },

    /// Publish or unpublish questions
    TogglePublish {
        ids: Vec<u64>,
        #[command(flatten)]
        user: UserArgs,
    },

    /// Create an unpublished copy of a question
    Clone {
        id: u64,
        #[command(flatten)]
        user: UserArgs,
    },
}

#[derive(Subcommand)]
pub enum TemplatesCommand {
    /// Templates for a channel page, e.g. `quizzes/science`
    List { path: String },
    /// Templates for a question page
    Detail { pretty_slug: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExportFormat {
    Json,
    Csv,
}
