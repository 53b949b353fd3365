use std::{
    fs,
    io::{self, BufRead, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use client::{AssignmentQuery, LogQuery, Route, TopicQuery};
use serde_json::Value;

use super::view;
use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List recent request logs, newest first
    Logs {
        #[arg(long, short, help = "Maximum number of entries (the service caps this at 200)")]
        limit: Option<u32>,

        #[arg(long, short, help = "Number of entries to skip")]
        offset: Option<u32>,
    },
    /// Show a single request log entry
    Log {
        /// Log entry id
        id: i64,
    },
    /// List request logs touching one assignment
    RequestLogs {
        /// Assignment id
        assignment: i64,

        #[arg(long, short, help = "Maximum number of entries")]
        limit: Option<u32>,

        #[arg(long, short, help = "Number of entries to skip")]
        offset: Option<u32>,
    },
    /// List registered users
    Users,
    /// Inspect, change or remove one user
    #[command(subcommand)]
    User(UserCommand),
    /// Manage the topic catalogue
    #[command(subcommand)]
    Topics(TopicsCommand),
    /// Manage the assignment catalogue
    #[command(subcommand)]
    Assignments(AssignmentsCommand),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Show a user record
    Show {
        /// User id
        id: i64,
    },
    /// Change fields of a user record
    Update {
        /// User id
        id: i64,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Delete a user
    Delete {
        /// User id
        id: i64,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TopicsCommand {
    /// List topics
    List {
        #[arg(long, short, help = "Only topics whose title or description contains this text")]
        query: Option<String>,

        #[arg(long, short, help = "Only topics of this difficulty")]
        difficulty: Option<String>,
    },
    /// Create a topic from a JSON object with `title`, `description`, `difficulty`
    Create(BodyArgs),
    /// Change fields of a topic
    Update {
        /// Topic id
        id: i64,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Delete a topic
    Delete {
        /// Topic id
        id: i64,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AssignmentsCommand {
    /// List assignments
    List {
        #[arg(long, short, help = "Only assignments whose title or description contains this text")]
        query: Option<String>,

        #[arg(long, short, help = "Only assignments of this topic")]
        topic: Option<i64>,
    },
    /// Create an assignment from a JSON object; `topic_id` and `title` are required
    Create(BodyArgs),
    /// Change fields of an assignment; `tests` replaces the whole test set
    Update {
        /// Assignment id
        id: i64,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Delete an assignment
    Delete {
        /// Assignment id
        id: i64,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
}

/// JSON request body, inline, from a file, or from stdin when neither is given.
#[derive(Args, Debug)]
pub struct BodyArgs {
    #[arg(
        long,
        conflicts_with = "file",
        help = "JSON object to send, e.g. '{\"title\":\"Joins\"}'"
    )]
    pub data: Option<String>,

    #[arg(long, short, help = "Read the JSON object from this file")]
    pub file: Option<PathBuf>,
}

pub async fn run(app: &App, command: AdminCommand) -> Result<()> {
    let body = match command {
        AdminCommand::Logs { limit, offset } => {
            view::open(app, &Route::AdminLogs).await?;
            app.core.admin_logs(&LogQuery { limit, offset }).await
        }
        AdminCommand::Log { id } => {
            view::open(app, &Route::AdminLogs).await?;
            app.core.admin_log(id).await
        }
        AdminCommand::RequestLogs {
            assignment,
            limit,
            offset,
        } => {
            view::open(app, &Route::AdminLogs).await?;
            app.core
                .assignment_request_logs(assignment, &LogQuery { limit, offset })
                .await
        }
        AdminCommand::Users => {
            view::open(app, &Route::AdminUsers).await?;
            app.core.admin_users().await
        }
        AdminCommand::User(command) => return run_user(app, command).await,
        AdminCommand::Topics(command) => return run_topics(app, command).await,
        AdminCommand::Assignments(command) => return run_assignments(app, command).await,
    };
    view::print_json(&body.map_err(view::core_error)?)
}

async fn run_user(app: &App, command: UserCommand) -> Result<()> {
    let body = match command {
        UserCommand::Show { id } => {
            view::open(app, &Route::AdminUsers).await?;
            app.core.admin_user(id).await
        }
        UserCommand::Update { id, body } => {
            let changes = read_body(body)?;
            view::open(app, &Route::AdminUsers).await?;
            app.core.update_admin_user(id, &changes).await
        }
        UserCommand::Delete { id, yes } => {
            view::open(app, &Route::AdminUsers).await?;
            if !confirm(&format!("Delete user {id}?"), yes)? {
                println!("Nothing deleted.");
                return Ok(());
            }
            app.core.delete_admin_user(id).await
        }
    };
    view::print_json(&body.map_err(view::core_error)?)
}

async fn run_topics(app: &App, command: TopicsCommand) -> Result<()> {
    let body = match command {
        TopicsCommand::List { query, difficulty } => {
            view::open(app, &Route::AdminTopics).await?;
            let filter = TopicQuery {
                q: query,
                difficulty,
            };
            app.core.list_topics(&filter).await
        }
        TopicsCommand::Create(body) => {
            let topic = read_body(body)?;
            view::open(app, &Route::AdminTopics).await?;
            app.core.create_topic(&topic).await
        }
        TopicsCommand::Update { id, body } => {
            let changes = read_body(body)?;
            view::open(app, &Route::AdminTopics).await?;
            app.core.update_topic(id, &changes).await
        }
        TopicsCommand::Delete { id, yes } => {
            view::open(app, &Route::AdminTopics).await?;
            if !confirm(&format!("Delete topic {id} and its assignments?"), yes)? {
                println!("Nothing deleted.");
                return Ok(());
            }
            app.core.delete_topic(id).await
        }
    };
    view::print_json(&body.map_err(view::core_error)?)
}

async fn run_assignments(app: &App, command: AssignmentsCommand) -> Result<()> {
    let body = match command {
        AssignmentsCommand::List { query, topic } => {
            view::open(app, &Route::AdminAssignments).await?;
            let filter = AssignmentQuery {
                q: query,
                topic_id: topic,
            };
            app.core.list_assignments(&filter).await
        }
        AssignmentsCommand::Create(body) => {
            let assignment = read_body(body)?;
            view::open(app, &Route::AdminAssignments).await?;
            app.core.create_assignment(&assignment).await
        }
        AssignmentsCommand::Update { id, body } => {
            let changes = read_body(body)?;
            view::open(app, &Route::AdminAssignments).await?;
            app.core.update_assignment(id, &changes).await
        }
        AssignmentsCommand::Delete { id, yes } => {
            view::open(app, &Route::AdminAssignments).await?;
            if !confirm(&format!("Delete assignment {id}?"), yes)? {
                println!("Nothing deleted.");
                return Ok(());
            }
            app.core.delete_assignment(id).await
        }
    };
    view::print_json(&body.map_err(view::core_error)?)
}

/// Parses the request body before anything is sent; it must be a JSON object.
fn read_body(args: BodyArgs) -> Result<Value> {
    let raw = match (args.data, args.file) {
        (Some(data), _) => data,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read request body from {}", path.display()))?,
        (None, None) => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read request body from stdin")?;
            raw
        }
    };
    let body: Value = serde_json::from_str(&raw).context("request body is not valid JSON")?;
    if !body.is_object() {
        bail!("request body must be a JSON object");
    }
    Ok(body)
}

fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{question} [y/N] ");
    io::stdout().flush().ok();
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
