use std::fmt;

use tracing::{debug, info, warn};

use crate::api::TaskApi;
use crate::error::{ApiError, StoreError};
use crate::model::task::{Task, TaskDraft, TaskId};

/// What to do with local state once the server confirms a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Merge the confirmed record into the list.
    Apply,
    /// Re-fetch the whole list.
    Reload,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::Apply
    }
}

/// A request the store can have outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Toggle(TaskId),
    Update(TaskId),
    Remove(TaskId),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Load => write!(f, "load"),
            Operation::Create => write!(f, "create"),
            Operation::Toggle(id) => write!(f, "toggle {}", id),
            Operation::Update(id) => write!(f, "update {}", id),
            Operation::Remove(id) => write!(f, "remove {}", id),
        }
    }
}

/// Local cache of the server's task list.
///
/// Every mutation is request-then-apply: nothing changes locally until the
/// server has answered successfully, so a failed call leaves the list as
/// it was. Methods take `&mut self`, which keeps one store from having two
/// requests in flight at once.
pub struct TaskStore<A: TaskApi> {
    api: A,
    tasks: Vec<Task>,
    editing: Option<Task>,
    sync: SyncMode,
}

impl<A: TaskApi> TaskStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            editing: None,
            sync: SyncMode::default(),
        }
    }

    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut Task> {
        self.editing.as_mut()
    }

    pub fn start_edit(&mut self, task: Task) {
        debug!(id = %task.id, "start editing");
        self.editing = Some(task);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replaces the whole list with the server's. Returns the task count.
    pub async fn load(&mut self) -> Result<usize, StoreError> {
        let tasks = self
            .api
            .list()
            .await
            .map_err(|e| failed(Operation::Load, e))?;
        info!(count = tasks.len(), "tasks loaded");
        self.tasks = tasks;
        Ok(self.tasks.len())
    }

    /// Creates a task from the draft and clears the draft on success.
    pub async fn create(&mut self, draft: &mut TaskDraft) -> Result<TaskId, StoreError> {
        if is_blank(&draft.title) {
            return Err(StoreError::EmptyTitle);
        }

        let created = self
            .api
            .create(draft)
            .await
            .map_err(|e| failed(Operation::Create, e))?;
        let id = created.id.clone();
        info!(id = %id, "task created");
        draft.clear();

        self.settle(|tasks| tasks.push(created)).await?;
        Ok(id)
    }

    pub async fn toggle(&mut self, id: &TaskId) -> Result<(), StoreError> {
        let outgoing = self
            .get(id)
            .map(Task::toggled)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let confirmed = self
            .api
            .update(&outgoing)
            .await
            .map_err(|e| failed(Operation::Toggle(id.clone()), e))?;
        info!(id = %id, completed = confirmed.completed, "task toggled");

        self.settle(|tasks| replace_in_place(tasks, id, confirmed)).await
    }

    /// Sends the full edited record and ends editing on success.
    pub async fn update(&mut self, edited: &Task) -> Result<(), StoreError> {
        if is_blank(&edited.title) {
            return Err(StoreError::EmptyTitle);
        }

        let id = edited.id.clone();
        let confirmed = self
            .api
            .update(edited)
            .await
            .map_err(|e| failed(Operation::Update(id.clone()), e))?;
        info!(id = %id, "task updated");
        self.editing = None;

        self.settle(|tasks| replace_in_place(tasks, &id, confirmed)).await
    }

    /// `update` applied to the task currently being edited.
    pub async fn update_editing(&mut self) -> Result<(), StoreError> {
        let edited = self.editing.clone().ok_or(StoreError::NotEditing)?;
        self.update(&edited).await
    }

    pub async fn remove(&mut self, id: &TaskId) -> Result<(), StoreError> {
        self.api
            .delete(id)
            .await
            .map_err(|e| failed(Operation::Remove(id.clone()), e))?;
        info!(id = %id, "task removed");

        if self.editing.as_ref().is_some_and(|t| &t.id == id) {
            self.editing = None;
        }
        self.settle(|tasks| tasks.retain(|t| &t.id != id)).await
    }

    /// Brings the list in line with a mutation the server has confirmed.
    /// A failed reload is reported as `ReloadFailed` and keeps the old list.
    async fn settle(&mut self, apply: impl FnOnce(&mut Vec<Task>)) -> Result<(), StoreError> {
        match self.sync {
            SyncMode::Apply => {
                apply(&mut self.tasks);
                Ok(())
            }
            SyncMode::Reload => match self.load().await {
                Ok(_) => Ok(()),
                Err(StoreError::Api(err)) => Err(StoreError::ReloadFailed(err)),
                Err(other) => Err(other),
            },
        }
    }
}

fn is_blank(title: &str) -> bool {
    title.trim().is_empty()
}

fn replace_in_place(tasks: &mut [Task], id: &TaskId, confirmed: Task) {
    for task in tasks.iter_mut().filter(|t| &t.id == id) {
        *task = confirmed.clone();
    }
}

fn failed(operation: Operation, err: ApiError) -> StoreError {
    warn!(operation = %operation, error = %err, "request failed");
    StoreError::Api(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::model::task::TaskStatus;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List,
        Create(TaskDraft),
        Update(Task),
        Delete(TaskId),
    }

    /// In-memory stand-in for the backend.
    #[derive(Default)]
    struct MockApi {
        server: Mutex<Vec<Task>>,
        calls: Mutex<Vec<Call>>,
        fail_with: Mutex<Option<u16>>,
        fail_list: Mutex<bool>,
        next_id: Mutex<u32>,
    }

    impl MockApi {
        fn with_tasks(tasks: Vec<Task>) -> Self {
            let api = Self::default();
            *api.server.lock().unwrap() = tasks;
            api
        }

        fn fail(&self, status: u16) {
            *self.fail_with.lock().unwrap() = Some(status);
        }

        fn recover(&self) {
            *self.fail_with.lock().unwrap() = None;
        }

        fn fail_list(&self) {
            *self.fail_list.lock().unwrap() = true;
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            match *self.fail_with.lock().unwrap() {
                Some(status) => Err(ApiError::Status { status, message: Some("boom".to_string()) }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl TaskApi for MockApi {
        async fn list(&self) -> Result<Vec<Task>, ApiError> {
            self.record(Call::List)?;
            if *self.fail_list.lock().unwrap() {
                return Err(ApiError::Status { status: 502, message: None });
            }
            Ok(self.server.lock().unwrap().clone())
        }

        async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
            self.record(Call::Create(draft.clone()))?;
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let mut task = Task::new(next_id.to_string(), draft.title.clone());
            task.description = draft.description.clone();
            task.deadline = draft.deadline;
            task.status = draft.status;
            task.completed = draft.status == Some(TaskStatus::Completed);
            self.server.lock().unwrap().push(task.clone());
            Ok(task)
        }

        async fn update(&self, task: &Task) -> Result<Task, ApiError> {
            self.record(Call::Update(task.clone()))?;
            let mut server = self.server.lock().unwrap();
            match server.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => {
                    *existing = task.clone();
                    Ok(task.clone())
                }
                None => Err(ApiError::Status { status: 404, message: None }),
            }
        }

        async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
            self.record(Call::Delete(id.clone()))?;
            self.server.lock().unwrap().retain(|t| &t.id != id);
            Ok(())
        }
    }

    fn sample_tasks() -> Vec<Task> {
        vec![Task::new("a", "First"), Task::new("b", "Second"), Task::new("c", "Third")]
    }

    async fn loaded_store(tasks: Vec<Task>) -> TaskStore<MockApi> {
        let mut store = TaskStore::new(MockApi::with_tasks(tasks));
        store.load().await.unwrap();
        store
    }

    fn ids(store: &TaskStore<MockApi>) -> Vec<&str> {
        store.tasks().iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_replaces_collection_in_order() {
        let store = loaded_store(sample_tasks()).await;
        assert_eq!(store.tasks(), sample_tasks().as_slice());
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let mut store = loaded_store(sample_tasks()).await;
        store.api().fail(500);

        let result = store.load().await;

        assert!(matches!(result, Err(StoreError::Api(ApiError::Status { status: 500, .. }))));
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_create_with_blank_title_is_noop() {
        let mut store = loaded_store(sample_tasks()).await;

        for title in ["", "   ", "\t\n"] {
            let mut draft = TaskDraft::new(title);
            draft.description = "kept".to_string();
            let result = store.create(&mut draft).await;

            assert!(matches!(result, Err(StoreError::EmptyTitle)));
            assert_eq!(draft.description, "kept");
        }
        assert_eq!(store.api().calls(), vec![Call::List]);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_create_appends_server_record_and_clears_draft() {
        let mut store = TaskStore::new(MockApi::default());
        let mut draft = TaskDraft {
            title: "Buy milk".to_string(),
            description: String::new(),
            deadline: NaiveDate::from_ymd_opt(2024, 1, 1),
            status: None,
        };

        let id = store.create(&mut draft).await.unwrap();

        assert_eq!(id, TaskId::new("1"));
        let mut expected = Task::new("1", "Buy milk");
        expected.deadline = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(store.tasks(), &[expected]);
        assert_eq!(draft, TaskDraft::default());
    }

    #[tokio::test]
    async fn test_failed_create_keeps_draft_and_list() {
        let mut store = loaded_store(sample_tasks()).await;
        store.api().fail(503);
        let mut draft = TaskDraft::new("Buy milk");

        assert!(store.create(&mut draft).await.is_err());

        assert_eq!(draft.title, "Buy milk");
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_replaces_only_that_record() {
        let mut store = loaded_store(sample_tasks()).await;

        store.toggle(&TaskId::new("b")).await.unwrap();

        let sent = store.api().calls().pop().unwrap();
        match sent {
            Call::Update(task) => {
                assert_eq!(task.id.as_str(), "b");
                assert!(task.completed);
            }
            other => panic!("unexpected call: {other:?}"),
        }
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert!(!store.tasks()[0].completed);
        assert!(store.tasks()[1].completed);
        assert!(!store.tasks()[2].completed);

        store.toggle(&TaskId::new("b")).await.unwrap();
        assert!(!store.tasks()[1].completed);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_sends_nothing() {
        let mut store = loaded_store(sample_tasks()).await;

        let result = store.toggle(&TaskId::new("zzz")).await;

        assert!(matches!(result, Err(StoreError::NotFound(id)) if id.as_str() == "zzz"));
        assert_eq!(store.api().calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn test_failed_toggle_leaves_record() {
        let mut store = loaded_store(sample_tasks()).await;
        store.api().fail(500);

        assert!(store.toggle(&TaskId::new("a")).await.is_err());
        assert!(!store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn test_update_with_blank_title_is_noop() {
        let mut store = loaded_store(sample_tasks()).await;
        let mut edited = store.tasks()[0].clone();
        store.start_edit(edited.clone());
        edited.title = "  ".to_string();

        let result = store.update(&edited).await;

        assert!(matches!(result, Err(StoreError::EmptyTitle)));
        assert_eq!(store.api().calls(), vec![Call::List]);
        assert_eq!(store.editing().map(|t| t.title.as_str()), Some("First"));
    }

    #[tokio::test]
    async fn test_update_replaces_and_clears_editing() {
        let mut store = loaded_store(sample_tasks()).await;
        store.start_edit(store.tasks()[1].clone());
        if let Some(editing) = store.editing_mut() {
            editing.title = "Second, revised".to_string();
            editing.description = "details".to_string();
        }

        store.update_editing().await.unwrap();

        assert!(store.editing().is_none());
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.tasks()[1].title, "Second, revised");
        assert_eq!(store.tasks()[1].description, "details");
    }

    #[tokio::test]
    async fn test_failed_update_keeps_editing() {
        let mut store = loaded_store(sample_tasks()).await;
        let mut edited = store.tasks()[0].clone();
        edited.title = "Renamed".to_string();
        store.start_edit(edited.clone());
        store.api().fail(500);

        assert!(store.update(&edited).await.is_err());
        assert!(store.editing().is_some());
        assert_eq!(store.tasks()[0].title, "First");
    }

    #[tokio::test]
    async fn test_update_editing_without_marker() {
        let mut store = TaskStore::new(MockApi::default());
        assert!(matches!(store.update_editing().await, Err(StoreError::NotEditing)));
    }

    #[tokio::test]
    async fn test_cancel_edit_does_not_touch_server() {
        let mut store = loaded_store(sample_tasks()).await;
        store.start_edit(store.tasks()[0].clone());
        store.cancel_edit();

        assert!(store.editing().is_none());
        assert_eq!(store.api().calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn test_remove_drops_exactly_one() {
        let mut store = loaded_store(sample_tasks()).await;

        store.remove(&TaskId::new("b")).await.unwrap();
        assert_eq!(ids(&store), vec!["a", "c"]);

        // Unknown ids still hit the server but change nothing locally
        store.remove(&TaskId::new("zzz")).await.unwrap();
        assert_eq!(ids(&store), vec!["a", "c"]);
        assert_eq!(store.api().calls().last(), Some(&Call::Delete(TaskId::new("zzz"))));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_list() {
        let mut store = loaded_store(sample_tasks()).await;
        store.api().fail(500);

        assert!(store.remove(&TaskId::new("a")).await.is_err());
        assert_eq!(ids(&store), vec!["a", "b", "c"]);

        store.api().recover();
        store.remove(&TaskId::new("a")).await.unwrap();
        assert_eq!(ids(&store), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_remove_ends_edit_of_that_task() {
        let mut store = loaded_store(sample_tasks()).await;
        store.start_edit(store.tasks()[0].clone());

        store.remove(&TaskId::new("a")).await.unwrap();
        assert!(store.editing().is_none());
    }

    #[tokio::test]
    async fn test_reload_mode_refetches_after_mutation() {
        let mut store =
            TaskStore::new(MockApi::with_tasks(sample_tasks())).with_sync(SyncMode::Reload);
        store.load().await.unwrap();

        // Another client adds a task behind our back
        store.api().server.lock().unwrap().push(Task::new("x", "Elsewhere"));
        store.toggle(&TaskId::new("a")).await.unwrap();

        assert_eq!(
            store.api().calls().iter().filter(|c| **c == Call::List).count(),
            2
        );
        assert_eq!(ids(&store), vec!["a", "b", "c", "x"]);
        assert!(store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn test_failed_reload_after_update_is_reported_as_committed() {
        let mut store =
            TaskStore::new(MockApi::with_tasks(sample_tasks())).with_sync(SyncMode::Reload);
        store.load().await.unwrap();
        let mut edited = store.tasks()[0].clone();
        edited.title = "Renamed".to_string();
        store.start_edit(edited.clone());
        store.api().fail_list();

        let err = store.update(&edited).await.unwrap_err();

        assert!(matches!(err, StoreError::ReloadFailed(ApiError::Status { status: 502, .. })));
        assert!(err.is_committed());
        assert!(store.editing().is_none());
        // Server has the change, local list is the last good fetch
        assert_eq!(store.api().server.lock().unwrap()[0].title, "Renamed");
        assert_eq!(store.tasks()[0].title, "First");
    }

    #[tokio::test]
    async fn test_failed_reload_after_create_still_clears_draft() {
        let mut store =
            TaskStore::new(MockApi::with_tasks(sample_tasks())).with_sync(SyncMode::Reload);
        store.load().await.unwrap();
        store.api().fail_list();
        let mut draft = TaskDraft::new("Buy milk");

        let err = store.create(&mut draft).await.unwrap_err();

        assert!(err.is_committed());
        assert_eq!(draft, TaskDraft::default());
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_committed() {
        let mut store = loaded_store(sample_tasks()).await;
        store.api().fail(500);

        let err = store.toggle(&TaskId::new("a")).await.unwrap_err();
        assert!(!err.is_committed());
    }

    #[tokio::test]
    async fn test_create_sends_chosen_status() {
        let mut store = TaskStore::new(MockApi::default());
        let mut draft = TaskDraft {
            status: Some(TaskStatus::InProgress),
            ..TaskDraft::new("Write report")
        };

        let id = store.create(&mut draft).await.unwrap();

        assert_eq!(
            store.api().calls(),
            vec![Call::Create(TaskDraft {
                status: Some(TaskStatus::InProgress),
                ..TaskDraft::new("Write report")
            })]
        );
        let created = store.get(&id).unwrap();
        assert_eq!(created.status, Some(TaskStatus::InProgress));
        assert!(!created.completed);
    }
}
