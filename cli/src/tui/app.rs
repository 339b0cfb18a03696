use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use taskdeck_core::{
    FormSubmission, Operation, Session, StoreError, Task, TaskApi, TaskDraft, TaskForm, TaskId,
    TaskStore,
};
use tracing::warn;

/// A server round trip triggered by a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Load,
    Toggle(TaskId),
    Remove(TaskId),
    Create(TaskDraft),
    Update(Task),
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Load => Operation::Load,
            Request::Toggle(id) => Operation::Toggle(id.clone()),
            Request::Remove(id) => Operation::Remove(id.clone()),
            Request::Create(_) => Operation::Create,
            Request::Update(task) => Operation::Update(task.id.clone()),
        }
    }
}

pub struct App<A: TaskApi> {
    pub store: TaskStore<A>,
    pub session: Session,
    pub auth_required: bool,
    pub state: TableState,
    pub form: Option<TaskForm>,
    pub notice: Option<String>,
    pub busy: Option<Operation>,
    pub should_quit: bool,
}

impl<A: TaskApi> App<A> {
    pub fn new(store: TaskStore<A>, session: Session, auth_required: bool) -> App<A> {
        App {
            store,
            session,
            auth_required,
            state: TableState::default(),
            form: None,
            notice: None,
            busy: None,
            should_quit: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks().get(i))
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected_task().map(|t| t.id.clone())
    }

    pub fn session_label(&self) -> &'static str {
        if !self.auth_required {
            "no auth"
        } else if self.session.is_authenticated() {
            "signed in"
        } else {
            "anonymous"
        }
    }

    pub fn next(&mut self) {
        if self.tasks().is_empty() { return; }

        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.tasks().len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.tasks().is_empty() { return; }

        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.tasks().len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    // Keep the selection on a real row after the list changed size
    fn clamp_selection(&mut self) {
        let len = self.tasks().len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn select_id(&mut self, id: &TaskId) {
        if let Some(i) = self.tasks().iter().position(|t| &t.id == id) {
            self.state.select(Some(i));
        }
    }

    /// Maps a key press to state changes, returning the request to send, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Request> {
        // Any key dismisses the notice
        if self.notice.take().is_some() {
            return None;
        }
        if self.form.is_some() {
            return self.handle_form_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.previous();
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.selected_id().map(Request::Toggle),
            KeyCode::Char('d') | KeyCode::Delete => self.selected_id().map(Request::Remove),
            KeyCode::Char('a') => {
                self.form = Some(TaskForm::new());
                None
            }
            KeyCode::Char('e') => {
                self.start_edit();
                None
            }
            KeyCode::Char('r') => Some(Request::Load),
            KeyCode::Char('L') => {
                self.logout();
                None
            }
            _ => None,
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Request> {
        let form = self.form.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.close_form();
                None
            }
            KeyCode::Enter => match form.submit() {
                Ok(FormSubmission::Create(draft)) => Some(Request::Create(draft)),
                Ok(FormSubmission::Update(task)) => Some(Request::Update(task)),
                Err(e) => {
                    self.notice = Some(e.to_string());
                    None
                }
            },
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.input_char(c);
                None
            }
            KeyCode::Backspace => {
                form.delete_char();
                None
            }
            KeyCode::Left => {
                form.move_cursor_left();
                None
            }
            KeyCode::Right => {
                form.move_cursor_right();
                None
            }
            _ => None,
        }
    }

    fn start_edit(&mut self) {
        if let Some(task) = self.selected_task().cloned() {
            self.form = Some(TaskForm::edit(&task));
            self.store.start_edit(task);
        }
    }

    fn close_form(&mut self) {
        if let Some(form) = self.form.take() {
            if form.is_editing() {
                self.store.cancel_edit();
            }
        }
    }

    fn logout(&mut self) {
        match self.session.logout() {
            Ok(()) => self.notice = Some("Signed out".to_string()),
            Err(e) => {
                warn!(error = %e, "logout failed");
                self.notice = Some(format!("Logout failed: {}", e));
            }
        }
    }

    /// Sends the request through the store. Failures become the notice;
    /// an empty title is ignored.
    ///
    /// After a create the form stays open, emptied for the next task. After
    /// an update it closes. Both also happen when the server took the change
    /// and only the reload failed.
    pub async fn perform(&mut self, request: Request) {
        let result = match request {
            Request::Load => self.store.load().await.map(|_| ()),
            Request::Toggle(id) => self.store.toggle(&id).await,
            Request::Remove(id) => self.store.remove(&id).await,
            Request::Create(mut draft) => {
                let result = self.store.create(&mut draft).await;
                if let Ok(id) = &result {
                    self.select_id(id);
                }
                let result = result.map(|_| ());
                if saved(&result) {
                    if let Some(form) = self.form.as_mut() {
                        form.reset();
                    }
                }
                result
            }
            Request::Update(task) => {
                let result = self.store.update(&task).await;
                if saved(&result) {
                    self.form = None;
                }
                result
            }
        };

        self.clamp_selection();
        if let Err(err) = result {
            if !err.is_validation() {
                self.notice = Some(err.to_string());
            }
        }
    }
}

// The server has the change, whether or not the list could be re-fetched.
fn saved(result: &Result<(), StoreError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => err.is_committed(),
    }
}
