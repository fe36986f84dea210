//! Bugtrack CLI entry point.

use anyhow::{Result, anyhow, bail};
use bugtrack::cli::{Cli, Command, TaskCommand, UserCommand};
use bugtrack::config::Config;
use bugtrack::db::Database;
use bugtrack::db::search::TaskSearch;
use bugtrack::types::{
    NewTask, TaskKind, TaskPatch, TaskPriority, TaskStatus, UserPatch, UserRole,
};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(db_path) = &cli.database {
        config.db_path = PathBuf::from(db_path);
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.db_path, config.project_key.clone())?;
    debug!(db_path = %config.db_path.display(), "database opened");

    run(cli.command, &db, &config)
}

fn run(command: Command, db: &Database, config: &Config) -> Result<()> {
    match command {
        Command::User(cmd) => run_user(cmd, db, config),
        Command::Login { username, password } => {
            let token = db.authenticate(&username, &password)?;
            print_json(&serde_json::json!({ "access_token": token, "token_type": "bearer" }))
        }
        Command::Task(cmd) => run_task(cmd, db, config),
    }
}

fn run_user(cmd: UserCommand, db: &Database, config: &Config) -> Result<()> {
    match cmd {
        UserCommand::Add {
            username,
            password,
            role,
        } => {
            let user = db.create_user(&username, &password, parse_role(&role)?)?;
            print_json(&user)
        }
        UserCommand::List { offset, limit } => {
            let users = db.list_users(offset, limit.unwrap_or(config.page_limit))?;
            print_json(&users)
        }
        UserCommand::Update {
            id,
            username,
            role,
            password,
            active,
        } => {
            let patch = UserPatch {
                username,
                role: role.as_deref().map(parse_role).transpose()?,
                password,
                is_active: active,
            };
            let user = db.update_user(id, patch)?;
            print_json(&user)
        }
    }
}

fn run_task(cmd: TaskCommand, db: &Database, config: &Config) -> Result<()> {
    match cmd {
        TaskCommand::Create {
            kind,
            title,
            priority,
            description,
            assignee,
            parent,
            creator,
        } => {
            let input = NewTask {
                kind: parse_kind(&kind)?,
                priority: parse_priority(&priority)?,
                title,
                description,
                assignee_id: assignee,
            };
            let task = match parent {
                Some(parent_id) => db.create_subtask(parent_id, input, creator)?,
                None => db.create_task(input, creator)?,
            };
            print_json(&task)
        }
        TaskCommand::Show { id } => {
            let detail = db
                .get_task_detail(id)?
                .ok_or_else(|| anyhow!("task not found: {}", id))?;
            print_json(&detail)
        }
        TaskCommand::List { offset, limit } => {
            let tasks = db.list_tasks(offset, limit.unwrap_or(config.page_limit))?;
            print_json(&tasks)
        }
        TaskCommand::Update {
            id,
            kind,
            priority,
            title,
            description,
            clear_description,
            blocks,
        } => {
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            let patch = TaskPatch {
                kind: kind.as_deref().map(parse_kind).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                title,
                description,
                blocks,
                ..TaskPatch::default()
            };
            let task = db.update_task(id, patch)?;
            print_json(&task)
        }
        TaskCommand::Status {
            id,
            status,
            assignee,
        } => {
            let task = db.change_status(id, parse_status(&status)?, assignee)?;
            print_json(&task)
        }
        TaskCommand::Delete { id } => {
            db.delete_task(id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        TaskCommand::Search {
            text,
            number,
            kind,
            status,
            creator,
            assignee,
            sort_by,
            sort_order,
            offset,
            limit,
        } => {
            let search = TaskSearch {
                text,
                number,
                kind: kind.as_deref().map(parse_kind).transpose()?,
                status: status.as_deref().map(parse_status).transpose()?,
                creator_id: creator,
                assignee_id: assignee,
                sort_by,
                sort_order,
                offset,
                limit,
            };
            let tasks = db.search_tasks(&search, config.page_limit)?;
            print_json(&tasks)
        }
    }
}

fn parse_role(s: &str) -> Result<UserRole> {
    UserRole::from_str(s)
        .ok_or_else(|| anyhow!("unknown role: {} (expected manager, team_lead, developer, or tester)", s))
}

fn parse_kind(s: &str) -> Result<TaskKind> {
    TaskKind::from_str(s).ok_or_else(|| anyhow!("unknown kind: {} (expected bug or task)", s))
}

fn parse_priority(s: &str) -> Result<TaskPriority> {
    TaskPriority::from_str(s)
        .ok_or_else(|| anyhow!("unknown priority: {} (expected critical, high, medium, or low)", s))
}

fn parse_status(s: &str) -> Result<TaskStatus> {
    match TaskStatus::from_str(s) {
        Some(status) => Ok(status),
        None => bail!(
            "unknown status: {} (expected to_do, in_progress, code_review, dev_test, testing, done, or wontfix)",
            s
        ),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
