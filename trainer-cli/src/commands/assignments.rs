use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use client::{AssignmentQuery, Route};
use shared::models::AttemptRequest;

use super::view;
use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum AssignmentsCommand {
    /// List assignments. Without --topic this is the admin catalogue.
    List {
        #[arg(long, short, help = "Only assignments whose title or description contains this text")]
        query: Option<String>,

        #[arg(long, short, help = "Only assignments of this topic")]
        topic: Option<i64>,
    },
    /// Show an assignment
    Show {
        /// Assignment id
        id: i64,
    },
    /// Show the collections an assignment runs against
    Schema {
        /// Assignment id
        id: i64,
    },
    /// Submit a query for grading
    Attempt {
        /// Assignment id
        id: i64,

        #[arg(
            long,
            conflicts_with = "file",
            help = "Query to submit, e.g. 'db.users.find({})'. Read from stdin when neither --code nor --file is given."
        )]
        code: Option<String>,

        #[arg(long, short, help = "Read the query from this file")]
        file: Option<PathBuf>,
    },
    /// List your previous attempts at an assignment
    History {
        /// Assignment id
        id: i64,
    },
}

pub async fn run(app: &App, command: AssignmentsCommand) -> Result<()> {
    let body = match command {
        AssignmentsCommand::List { query, topic } => {
            let route = topic.map_or(Route::AdminAssignments, |id| Route::Topic { id });
            view::open(app, &route).await?;
            let filter = AssignmentQuery {
                q: query,
                topic_id: topic,
            };
            app.core.list_assignments(&filter).await
        }
        AssignmentsCommand::Show { id } => {
            view::open(app, &Route::Assignment { id }).await?;
            app.core.get_assignment(id).await
        }
        AssignmentsCommand::Schema { id } => {
            view::open(app, &Route::Assignment { id }).await?;
            app.core.assignment_schema(id).await
        }
        AssignmentsCommand::Attempt { id, code, file } => {
            let attempt = AttemptRequest::new(read_code(code, file)?);
            if attempt.code.is_empty() {
                bail!("nothing to submit: the query is empty");
            }
            view::open(app, &Route::Assignment { id }).await?;
            app.core.submit_attempt(id, &attempt).await
        }
        AssignmentsCommand::History { id } => {
            view::open(app, &Route::Assignment { id }).await?;
            app.core.list_attempts(id).await
        }
    };
    view::print_json(&body.map_err(view::core_error)?)
}

fn read_code(code: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code);
    }
    if let Some(path) = file {
        return fs::read_to_string(&path)
            .with_context(|| format!("failed to read query from {}", path.display()));
    }
    let mut code = String::new();
    io::stdin()
        .read_to_string(&mut code)
        .context("failed to read query from stdin")?;
    Ok(code)
}
