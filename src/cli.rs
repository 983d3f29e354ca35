use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::domain::Difficulty;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "qsheet")]
#[command(bin_name = "qsheet")]
#[command(version)]
#[command(about = "Track progress through a topic / sub-topic / question practice sheet")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        env = "QSHEET_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        global = true,
        help = "Path to the TOML config file."
    )]
    pub config: PathBuf,

    #[arg(
        short = 'd',
        long,
        env = "QSHEET_DB_PATH",
        global = true,
        help = "Path to the SQLite snapshot database (overrides db_path in the config)."
    )]
    pub db: Option<String>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (repeat for more)."
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Populate an empty sheet from the question feed.")]
    Hydrate(HydrateArgs),
    #[command(about = "Show the sheet as a tree.")]
    Ls(ListArgs),
    #[command(about = "Show solved counts per topic.")]
    Progress(JsonArgs),
    #[command(about = "Add, rename, remove, or reorder topics.")]
    Topic(TopicArgs),
    #[command(about = "Add, rename, remove, or reorder sub-topics.")]
    Sub(SubArgs),
    #[command(about = "Manage questions and their solved/starred flags.")]
    Question(QuestionArgs),
    #[command(about = "Show storage and hydration status.")]
    Status(JsonArgs),
    #[command(about = "Print the versioned snapshot document.")]
    Export,
    #[command(about = "Empty the sheet so it can be hydrated again.")]
    Reset(ResetArgs),
    #[command(about = "Print or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct HydrateArgs {
    #[arg(long, conflicts_with = "url", help = "Read the feed from a local JSON file.")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Fetch the feed from this URL.")]
    pub url: Option<String>,

    #[arg(long, help = "Render output as JSON.")]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long, help = "Render output as JSON.")]
    pub json: bool,

    #[arg(long, help = "Only show questions that are not solved yet.")]
    pub unsolved: bool,

    #[arg(long, help = "Only show starred questions.")]
    pub starred: bool,
}

#[derive(Debug, Clone, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Render output as JSON.")]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ResetArgs {
    #[arg(long, help = "Confirm that the whole sheet should be discarded.")]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish, elvish, powershell). Detected from $SHELL when omitted.")]
    pub shell: Option<String>,

    #[arg(long, help = "Write the completions into the shell's completion directory.")]
    pub install: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TopicArgs {
    #[command(subcommand)]
    pub command: TopicSubcommands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TopicSubcommands {
    #[command(about = "Append a new empty topic.")]
    Add { title: String },
    #[command(about = "Change a topic title.")]
    Rename { id: String, title: String },
    #[command(about = "Remove a topic with all of its sub-topics and questions.")]
    Rm { id: String },
    #[command(about = "Move the topic at FROM so it ends up at TO.")]
    Move { from: usize, to: usize },
    #[command(about = "Drop topic ACTIVE onto the position of topic OVER.")]
    Drag { active: String, over: Option<String> },
}

#[derive(Debug, Clone, Args)]
pub struct SubArgs {
    #[command(subcommand)]
    pub command: SubSubcommands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SubSubcommands {
    #[command(about = "Append a new empty sub-topic to a topic.")]
    Add { topic: String, title: String },
    #[command(about = "Change a sub-topic title.")]
    Rename { id: String, title: String },
    #[command(about = "Remove a sub-topic with all of its questions.")]
    Rm { id: String },
    #[command(about = "Move the sub-topic at FROM within TOPIC so it ends up at TO.")]
    Move { topic: String, from: usize, to: usize },
    #[command(about = "Drop sub-topic ACTIVE onto the position of sub-topic OVER.")]
    Drag { active: String, over: Option<String> },
}

#[derive(Debug, Clone, Args)]
pub struct QuestionArgs {
    #[command(subcommand)]
    pub command: QuestionSubcommands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum QuestionSubcommands {
    #[command(about = "Append a new unsolved Easy question to a sub-topic.")]
    Add { sub: String, title: String },
    #[command(about = "Change a question title.")]
    Rename { id: String, title: String },
    #[command(about = "Remove a question.")]
    Rm { id: String },
    #[command(about = "Move the question at FROM within SUB so it ends up at TO.")]
    Move { sub: String, from: usize, to: usize },
    #[command(about = "Drop question ACTIVE onto the position of question OVER.")]
    Drag { active: String, over: Option<String> },
    #[command(about = "Toggle the solved flag.")]
    Solve { id: String },
    #[command(about = "Toggle the starred flag.")]
    Star { id: String },
    #[command(about = "Set the difficulty (easy, medium, hard).")]
    Difficulty { id: String, level: Difficulty },
}
