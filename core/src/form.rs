//! Field state for the create/edit task form.

use chrono::{Local, NaiveDate};

use crate::error::FormError;
use crate::model::task::{Task, TaskDraft, TaskStatus};
use crate::time::{format_deadline, parse_deadline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Deadline,
    Status,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Description, Field::Deadline, Field::Status];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Deadline => "Deadline",
            Field::Status => "Status",
        }
    }

    /// Free-text fields take typed input; `Status` is picked from a list.
    pub fn is_text(&self) -> bool {
        !matches!(self, Field::Status)
    }

    fn next(self) -> Field {
        match self {
            Field::Title => Field::Description,
            Field::Description => Field::Deadline,
            Field::Deadline => Field::Status,
            Field::Status => Field::Title,
        }
    }

    fn previous(self) -> Field {
        match self {
            Field::Title => Field::Status,
            Field::Description => Field::Title,
            Field::Deadline => Field::Description,
            Field::Status => Field::Deadline,
        }
    }
}

/// What the form hands to its submit callback.
#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    Create(TaskDraft),
    Update(Task),
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    original: Option<Task>,
    title: String,
    description: String,
    deadline: String,
    // None leaves the choice to the server
    status: Option<TaskStatus>,
    focus: Field,
    // In chars, not bytes
    cursor: usize,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self {
            original: None,
            title: String::new(),
            description: String::new(),
            deadline: String::new(),
            status: None,
            focus: Field::Title,
            cursor: 0,
        }
    }

    /// Form pre-filled from an existing task.
    pub fn edit(task: &Task) -> Self {
        let mut form = Self {
            original: Some(task.clone()),
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: format_deadline(task.deadline),
            status: task.status,
            focus: Field::Title,
            cursor: 0,
        };
        form.cursor = form.value(Field::Title).chars().count();
        form
    }

    pub fn is_editing(&self) -> bool {
        self.original.is_some()
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Field text as shown. `Status` reads as its label, or "" when unset.
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Deadline => &self.deadline,
            Field::Status => self.status.map(|s| s.label()).unwrap_or(""),
        }
    }

    pub fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    fn focused_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::Deadline => Some(&mut self.deadline),
            Field::Status => None,
        }
    }

    /// Replaces a text field. `Status` is changed with `set_status`.
    pub fn set_value(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let len = value.chars().count();
        match field {
            Field::Title => self.title = value,
            Field::Description => self.description = value,
            Field::Deadline => self.deadline = value,
            Field::Status => return,
        }
        if field == self.focus {
            self.cursor = len;
        }
    }

    pub fn set_status(&mut self, status: Option<TaskStatus>) {
        self.status = status;
    }

    pub fn focus_field(&mut self, field: Field) {
        self.focus = field;
        self.cursor = if field.is_text() { self.value(field).chars().count() } else { 0 };
    }

    pub fn next_field(&mut self) {
        self.focus_field(self.focus.next());
    }

    pub fn previous_field(&mut self) {
        self.focus_field(self.focus.previous());
    }

    pub fn input_char(&mut self, c: char) {
        let cursor = self.cursor;
        let Some(input) = self.focused_mut() else { return };
        let byte_index = byte_index(input, cursor);
        input.insert(byte_index, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            let cursor = self.cursor;
            let Some(input) = self.focused_mut() else { return };
            let byte_index = byte_index(input, cursor - 1);
            input.remove(byte_index);
            self.cursor -= 1;
        }
    }

    /// Moves the cursor, or steps the status back when it has focus.
    pub fn move_cursor_left(&mut self) {
        if !self.focus.is_text() {
            self.cycle_status(false);
        } else if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Moves the cursor, or steps the status forward when it has focus.
    pub fn move_cursor_right(&mut self) {
        if !self.focus.is_text() {
            self.cycle_status(true);
        } else if self.cursor < self.value(self.focus).chars().count() {
            self.cursor += 1;
        }
    }

    // A task that already has a status cannot go back to "unset".
    fn status_choices(&self) -> Vec<Option<TaskStatus>> {
        let can_unset = self.original.as_ref().map_or(true, |t| t.status.is_none());
        let unset = can_unset.then_some(None);
        unset.into_iter().chain(TaskStatus::ALL.map(Some)).collect()
    }

    fn cycle_status(&mut self, forward: bool) {
        let choices = self.status_choices();
        let len = choices.len();
        let at = choices.iter().position(|s| *s == self.status).unwrap_or(0);
        let next = if forward { (at + 1) % len } else { (at + len - 1) % len };
        self.status = choices[next];
    }

    /// Empties every field, ready for the next task. Edit mode is kept.
    pub fn reset(&mut self) {
        self.title.clear();
        self.description.clear();
        self.deadline.clear();
        self.status = None;
        self.focus = Field::Title;
        self.cursor = 0;
    }

    /// Assembles the current field values. Deadline text is read relative to
    /// the local date.
    pub fn submit(&self) -> Result<FormSubmission, FormError> {
        self.submit_on(Local::now().date_naive())
    }

    pub fn submit_on(&self, today: NaiveDate) -> Result<FormSubmission, FormError> {
        let deadline =
            parse_deadline(&self.deadline, today).map_err(|e| FormError::InvalidDeadline {
                input: self.deadline.trim().to_string(),
                reason: e.to_string(),
            })?;

        Ok(match &self.original {
            Some(original) => {
                let mut task = original.clone();
                task.title = self.title.clone();
                task.description = self.description.clone();
                task.deadline = deadline;
                if let Some(status) = self.status {
                    task.status = Some(status);
                    task.set_completed(status == TaskStatus::Completed);
                }
                FormSubmission::Update(task)
            }
            None => FormSubmission::Create(TaskDraft {
                title: self.title.clone(),
                description: self.description.clone(),
                deadline,
                status: self.status,
            }),
        })
    }
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map(|(i, _)| i).unwrap_or(s.len())
}
