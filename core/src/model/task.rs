use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned task identifier. The client only ever echoes these back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] =
        [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// A task as the backend returns it.
///
/// `completed` is the one completion flag the client reasons about. Servers
/// that track a progress `status` get it back kept in step with `completed`,
/// and any field the client does not model is carried in `extra` so an
/// update sends back the whole record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub deadline: Option<NaiveDate>,
    pub completed: bool,
    pub status: Option<TaskStatus>,
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            deadline: None,
            completed: false,
            status: None,
            extra: Map::new(),
        }
    }

    pub fn set_completed(&mut self, done: bool) {
        self.completed = done;
        if let Some(status) = self.status.as_mut() {
            if done {
                *status = TaskStatus::Completed;
            } else if *status == TaskStatus::Completed {
                *status = TaskStatus::Pending;
            }
        }
    }

    /// Copy of this record with completion inverted.
    pub fn toggled(&self) -> Task {
        let mut task = self.clone();
        task.set_completed(!self.completed);
        task
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            Some(status) => status.label(),
            None if self.completed => TaskStatus::Completed.label(),
            None => TaskStatus::Pending.label(),
        }
    }
}

/// Payload of a create request. The server fills in everything else.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "deadline_format::serialize")]
    pub deadline: Option<NaiveDate>,
    /// Only sent when chosen, so completion-flag servers see no extra key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// Wire shape. Mongo-style backends key records by `_id`; `id` is accepted too.
#[derive(Serialize, Deserialize)]
struct TaskRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    mongo_id: Option<TaskId>,
    #[serde(default, skip_serializing)]
    id: Option<TaskId>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, with = "deadline_format")]
    deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = String;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let id = record
            .mongo_id
            .or(record.id)
            .ok_or_else(|| "task record has neither `_id` nor `id`".to_string())?;
        let completed = record
            .completed
            .unwrap_or(record.status == Some(TaskStatus::Completed));

        Ok(Task {
            id,
            title: record.title,
            description: record.description.unwrap_or_default(),
            deadline: record.deadline,
            completed,
            status: record.status,
            extra: record.extra,
        })
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        TaskRecord {
            mongo_id: Some(task.id),
            id: None,
            title: task.title,
            description: Some(task.description),
            deadline: task.deadline,
            completed: Some(task.completed),
            status: task.status,
            extra: task.extra,
        }
    }
}

pub(crate) mod deadline_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(deadline: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match deadline {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    // Browsers send "" for an unset date input; Mongo hands dates back as
    // full timestamps.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let Some(raw) = raw else { return Ok(None) };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(Some(date));
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.date_naive()))
            .map_err(|_| de::Error::custom(format!("invalid deadline: {}", raw)))
    }
}
