//! In-memory backend shared by the command and TUI tests.

use std::sync::Mutex;

use async_trait::async_trait;
use taskdeck_core::{ApiError, Task, TaskApi, TaskDraft, TaskId, TaskStatus};

#[derive(Default)]
pub struct FakeApi {
    pub tasks: Mutex<Vec<Task>>,
    /// Every call fails with 502.
    pub down: Mutex<bool>,
    /// Only `list` fails, so mutations go through and a reload does not.
    pub list_down: Mutex<bool>,
    pub updates: Mutex<Vec<Task>>,
}

impl FakeApi {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = Self::default();
        *api.tasks.lock().unwrap() = tasks;
        api
    }

    pub fn last_update(&self) -> Option<Task> {
        self.updates.lock().unwrap().last().cloned()
    }

    fn check(&self) -> Result<(), ApiError> {
        if *self.down.lock().unwrap() {
            Err(ApiError::Status { status: 502, message: Some("Bad Gateway".to_string()) })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        self.check()?;
        if *self.list_down.lock().unwrap() {
            return Err(ApiError::Status { status: 503, message: None });
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.check()?;
        let mut tasks = self.tasks.lock().unwrap();
        let mut task = Task::new(format!("t{}", tasks.len() + 1), draft.title.clone());
        task.description = draft.description.clone();
        task.deadline = draft.deadline;
        task.status = draft.status;
        task.completed = draft.status == Some(TaskStatus::Completed);
        tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<Task, ApiError> {
        self.check()?;
        self.updates.lock().unwrap().push(task.clone());
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(task.clone())
            }
            None => Err(ApiError::Status { status: 404, message: None }),
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        self.check()?;
        self.tasks.lock().unwrap().retain(|t| &t.id != id);
        Ok(())
    }
}
