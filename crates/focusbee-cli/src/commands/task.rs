//! Task list commands for CLI.

use clap::Subcommand;
use focusbee_core::{Database, TaskFilter, TaskList};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task text
        text: String,
    },
    /// List tasks
    List {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        #[arg(long)]
        json: bool,
    },
    /// Toggle a task between active and completed
    Done {
        /// Task ID
        id: String,
    },
    /// Replace a task's text
    Edit {
        /// Task ID
        id: String,
        /// New text
        text: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Delete every completed task
    ClearCompleted,
    /// Totals and completion rate
    Stats,
}

pub fn run(action: TaskAction) -> CliResult {
    let db = Database::open()?;
    let mut tasks = TaskList::load(&db);

    match action {
        TaskAction::Add { text } => {
            let task = tasks.add(&text)?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List { filter, json } => {
            let shown: Vec<_> = tasks.filtered(filter).collect();
            if json {
                print_json(&shown)?;
            } else if shown.is_empty() {
                println!("No {filter} tasks.");
            } else {
                for task in shown {
                    let mark = if task.completed { "x" } else { " " };
                    println!("[{mark}] {}  {}", task.id, task.text);
                }
            }
            return Ok(());
        }
        TaskAction::Done { id } => {
            let completed = tasks.toggle(&id)?;
            println!("{}", if completed { "completed" } else { "reopened" });
        }
        TaskAction::Edit { id, text } => {
            tasks.edit(&id, &text)?;
            println!("Task updated: {id}");
        }
        TaskAction::Delete { id } => {
            let task = tasks.delete(&id)?;
            println!("Task deleted: {}", task.id);
        }
        TaskAction::ClearCompleted => {
            let removed = tasks.clear_completed();
            println!("Removed {removed} completed task(s).");
        }
        TaskAction::Stats => {
            print_json(&tasks.stats())?;
            return Ok(());
        }
    }

    tasks.save(&db);
    Ok(())
}
