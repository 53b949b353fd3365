use anyhow::Result;
use clap::Subcommand;
use client::{Route, TopicQuery};

use super::view;
use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum TopicsCommand {
    /// List topics
    List {
        #[arg(long, short, help = "Only topics whose title or description contains this text")]
        query: Option<String>,

        #[arg(long, short, help = "Only topics of this difficulty (e.g. easy, medium, hard)")]
        difficulty: Option<String>,
    },
    /// Show a topic together with its assignments
    Show {
        /// Topic id
        id: i64,
    },
    /// List only the assignments of a topic
    Assignments {
        /// Topic id
        id: i64,
    },
}

pub async fn run(app: &App, command: TopicsCommand) -> Result<()> {
    match command {
        TopicsCommand::List { query, difficulty } => {
            view::open(app, &Route::Topics).await?;
            let filter = TopicQuery {
                q: query,
                difficulty,
            };
            let topics = app.core.list_topics(&filter).await.map_err(view::core_error)?;
            view::print_json(&topics)
        }
        TopicsCommand::Show { id } => {
            view::open(app, &Route::Topic { id }).await?;
            let topic = app.core.get_topic(id).await.map_err(view::core_error)?;
            view::print_json(&topic)
        }
        TopicsCommand::Assignments { id } => {
            view::open(app, &Route::Topic { id }).await?;
            let assignments = app
                .core
                .topic_assignments(id)
                .await
                .map_err(view::core_error)?;
            view::print_json(&assignments)
        }
    }
}
