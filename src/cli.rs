//! CLI command definitions for bugtrack.
//!
//! This module defines the CLI structure using clap's derive macros; the
//! dispatch logic lives in the binary.

use clap::{Parser, Subcommand};

/// Bug and task tracking CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Verify credentials and print a bearer token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new user
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Role: manager, team_lead, developer, or tester
        #[arg(long, default_value = "developer")]
        role: String,
    },

    /// List users
    List {
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Update a user (partial)
    Update {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task
    Create {
        /// Kind: bug or task
        #[arg(long)]
        kind: String,
        #[arg(long)]
        title: String,
        /// Priority: critical, high, medium, or low
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<i64>,
        /// Parent task id, for subtasks
        #[arg(long)]
        parent: Option<i64>,
        /// Creator user id
        #[arg(long)]
        creator: i64,
    },

    /// Show a task with its relations
    Show { id: i64 },

    /// List tasks, most recently updated first
    List {
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Update task fields (partial)
    Update {
        id: i64,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Clear the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        /// Replace the set of task ids this task blocks (comma-separated;
        /// pass the flag with no value to clear the set)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        blocks: Option<Vec<i64>>,
    },

    /// Move a task to a new status, replacing its assignee
    Status {
        id: i64,
        /// Target status, e.g. in_progress or wontfix
        status: String,
        #[arg(long)]
        assignee: Option<i64>,
    },

    /// Delete a task permanently
    Delete { id: i64 },

    /// Search tasks
    Search {
        /// Substring match over title or description
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        creator: Option<i64>,
        #[arg(long)]
        assignee: Option<i64>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        sort_order: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long)]
        limit: Option<i64>,
    },
}
