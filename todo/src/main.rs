//! Command-line front end for the todo collection.
//!
//! Each invocation loads the collection, applies one command, prints the
//! result, and flushes before exiting.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tasklist_core::environment::{SystemClock, UuidGenerator};
use todo::{
    telemetry, FileStorage, PersistenceGateway, TodoApp, TodoConfig, TodoEnvironment, TodoId,
};

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Manage a short list of todos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a todo
    Add {
        /// Title, 1 to 30 characters
        title: String,
    },
    /// Mark a todo as finished
    Finish {
        /// Todo id
        id: String,
    },
    /// Delete a todo
    Delete {
        /// Todo id
        id: String,
    },
    /// List todos
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = TodoConfig::from_env();
    telemetry::init_tracing(&config.log_filter);

    let cli = Cli::parse();

    let storage = FileStorage::open(&config.data_dir).with_context(|| {
        format!("failed to open data directory {}", config.data_dir.display())
    })?;
    let persistence = PersistenceGateway::new(Arc::new(storage))
        .with_key(config.storage_key.clone())
        .with_debounce(config.persist_debounce());
    let env = TodoEnvironment::new(Arc::new(SystemClock), Arc::new(UuidGenerator), persistence)
        .with_max_unfinished(config.max_unfinished)
        .with_message_ttl(config.message_ttl());

    let app = TodoApp::open(env);

    match cli.command {
        Command::Add { title } => app.add_todo(title).await,
        Command::Finish { id } => app.finish_todo(&TodoId::new(id)).await,
        Command::Delete { id } => app.delete_todo(&TodoId::new(id)).await,
        Command::List => {},
    }

    app.flush().await;

    for todo in app.todos().await {
        let status = if todo.finished { "✓" } else { " " };
        println!(
            "[{status}] {}  {}  ({})",
            todo.id,
            todo.title,
            todo.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    for message in app.messages().await {
        println!("{}: {}", message.kind, message.text);
    }

    Ok(())
}
