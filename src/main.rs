use clap::{Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use tasklist::render::render_list;
use tasklist::task::{normalize_date_time, parse_date_time};
use tasklist::{Backend, Config, Slot, TaskStore, View, local_now};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Task list with due dates, stored locally")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to config.yaml (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding task data (overrides config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend: file or sqlite (overrides config)
    #[arg(short, long, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task due at DATETIME (YYYY-MM-DDTHH:MM or YYYY-MM-DD)
    Add { text: String, date_time: String },

    /// Mark a task complete, or undo completion
    Done { id: i64 },

    /// Replace a task's text and due date/time
    Edit { id: i64, text: String, date_time: String },

    /// Delete a task
    Rm { id: i64 },

    /// Show tasks, pending first, soonest due first
    List {
        /// all, pending, completed or overdue
        #[arg(short, long, default_value_t = View::All)]
        view: View,
    },

    /// Delete all completed tasks
    Clear,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let mut store = TaskStore::open(config.open_slot()?, config.key.as_str())?;

    let view = match cli.command.unwrap_or(Commands::List { view: View::All }) {
        Commands::Add { text, date_time } => {
            let date_time = normalize_date_time(&date_time);
            if !date_time.is_empty() && parse_date_time(&date_time).is_none() {
                println!("Unrecognized date/time: {}", date_time);
                return Ok(());
            }
            match store.add(&text, &date_time)? {
                Some(task) => println!("Added {}", task.id),
                None => println!("Task text and date/time are required"),
            }
            View::All
        }
        Commands::Done { id } => {
            match store.toggle_complete(id)? {
                Some(task) if task.completed => println!("Completed {}", id),
                Some(_) => println!("Reopened {}", id),
                None => println!("No task with id {}", id),
            }
            View::All
        }
        Commands::Edit { id, text, date_time } => {
            let date_time = normalize_date_time(&date_time);
            if !date_time.is_empty() && parse_date_time(&date_time).is_none() {
                println!("Unrecognized date/time: {}", date_time);
                return Ok(());
            }
            if store.get(id).is_none() {
                println!("No task with id {}", id);
                return Ok(());
            }
            match store.edit(id, &text, &date_time)? {
                Some(_) => println!("Updated {}", id),
                None => println!("Task text and date/time are required"),
            }
            View::All
        }
        Commands::Rm { id } => {
            if store.delete(id)? {
                println!("Deleted {}", id);
            } else {
                println!("No task with id {}", id);
            }
            View::All
        }
        Commands::Clear => {
            let removed = store.clear_completed()?;
            println!("Removed {} completed task(s)", removed);
            View::All
        }
        Commands::List { view } => view,
    };

    print_tasks(&store, view);
    Ok(())
}

/// Re-render the current state after every command
fn print_tasks<S: Slot>(store: &TaskStore<S>, view: View) {
    let now = local_now();
    let tasks = view.apply(store.list(), &now);
    println!("{}", render_list(&tasks, &now));
}
