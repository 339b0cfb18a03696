use anyhow::{Context, Result};
use chrono::Local;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskdeck_core::{
    format_deadline, parse_deadline, Task, TaskApi, TaskDraft, TaskId, TaskStatus, TaskStore,
};

// Helper struct for Table Row
#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        let deadline = format_deadline(task.deadline);
        TaskRow {
            id: task.id.to_string(),
            done: if task.completed { "✔" } else { "☐" },
            title: task.title.clone(),
            deadline: if deadline.is_empty() { "-".to_string() } else { deadline },
            status: task.status_label(),
        }
    }
}

/// Field values given on the command line. `None` leaves a field alone.
#[derive(Debug, Default)]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Deadline text; an empty string clears the deadline.
    pub deadline: Option<String>,
    pub status: Option<TaskStatus>,
}

fn deadline_arg(text: &str) -> Result<Option<chrono::NaiveDate>> {
    parse_deadline(text, Local::now().date_naive())
        .with_context(|| format!("Invalid deadline '{}'", text))
}

pub async fn list<A: TaskApi>(store: &mut TaskStore<A>) -> Result<()> {
    store.load().await?;
    if store.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    let rows: Vec<TaskRow> = store.tasks().iter().map(TaskRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

pub async fn add<A: TaskApi>(store: &mut TaskStore<A>, fields: TaskFields) -> Result<()> {
    let mut draft = TaskDraft {
        title: fields.title.unwrap_or_default(),
        description: fields.description.unwrap_or_default(),
        deadline: fields.deadline.as_deref().map(deadline_arg).transpose()?.flatten(),
        status: fields.status,
    };
    let id = store.create(&mut draft).await?;
    if let Some(task) = store.get(&id) {
        println!("Task added: {} (ID: {})", task.title, task.id);
        if let Some(d) = task.deadline {
            println!("  Deadline: {}", d);
        }
    }
    Ok(())
}

pub async fn toggle<A: TaskApi>(store: &mut TaskStore<A>, id: TaskId) -> Result<()> {
    store.load().await?;
    store.toggle(&id).await?;
    if let Some(task) = store.get(&id) {
        let state = if task.completed { "completed" } else { "reopened" };
        println!("Task {}: {}", state, task.title);
    }
    Ok(())
}

/// Loads the task, applies the given fields and PUTs the whole record back.
pub async fn edit<A: TaskApi>(
    store: &mut TaskStore<A>,
    id: TaskId,
    fields: TaskFields,
) -> Result<()> {
    store.load().await?;
    let task = store
        .get(&id)
        .cloned()
        .with_context(|| format!("Task not found: {}", id))?;
    let deadline = fields.deadline.as_deref().map(deadline_arg).transpose()?;

    store.start_edit(task);
    if let Some(editing) = store.editing_mut() {
        if let Some(title) = fields.title {
            editing.title = title;
        }
        if let Some(description) = fields.description {
            editing.description = description;
        }
        if let Some(deadline) = deadline {
            editing.deadline = deadline;
        }
        if let Some(status) = fields.status {
            editing.status = Some(status);
            editing.set_completed(status == TaskStatus::Completed);
        }
    }
    store.update_editing().await?;
    println!("Task updated: {}", id);
    Ok(())
}

pub async fn remove<A: TaskApi>(store: &mut TaskStore<A>, id: TaskId) -> Result<()> {
    store.remove(&id).await?;
    println!("Task removed: {}", id);
    Ok(())
}
