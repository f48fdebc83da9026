use clap::{Args, Parser, Subcommand};

use crate::model::todo::{Priority, TodoId};
use crate::model::view::{Filter, SortKey};

#[derive(Parser)]
#[command(name = "tl", about = concat!("[x] ticklist v", env!("CARGO_PKG_VERSION"), " - a small todo list"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a ticklist workspace in the current directory
    Init(InitArgs),
    /// Add a todo
    Add(AddArgs),
    /// List todos
    List(ListArgs),
    /// Flip a todo between open and completed
    Toggle(IdArg),
    /// Delete a todo
    Rm(IdArg),
    /// Change a todo's text
    Rename(RenameArgs),
    /// Delete every completed todo
    Clear,
    /// Complete everything, or reopen everything if all are done
    ToggleAll,
    /// Show completion statistics
    Stats,
    /// Interactive session that follows changes made by other processes
    Shell,
}

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite the config even if .ticklist/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Todo text
    pub text: String,
    /// Priority (low, medium, high)
    #[arg(short, long)]
    pub priority: Option<Priority>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show only these todos (all, active, completed)
    #[arg(long)]
    pub filter: Option<Filter>,
    /// Case-insensitive text to look for
    #[arg(long)]
    pub search: Option<String>,
    /// Ordering (newest, oldest, alphabetical, priority)
    #[arg(long)]
    pub sort: Option<SortKey>,
}

#[derive(Args)]
pub struct IdArg {
    /// Todo id
    pub id: TodoId,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Todo id
    pub id: TodoId,
    /// New text
    pub text: String,
}
