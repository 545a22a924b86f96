//! JSON Lines backed storage for users and to-dos
//!
//! The whole state lives in memory behind a `parking_lot::RwLock`. Every
//! mutation rewrites the data file atomically while the write lock is held,
//! so the file always matches a state some reader could have observed.

mod todos;
mod users;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::types::{Todo, User};
use crate::utils::write_atomic;

/// One line of the data file
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record {
    User(User),
    Todo(Todo),
}

/// Borrowed form of [`Record`] used when writing
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RecordRef<'a> {
    User(&'a User),
    Todo(&'a Todo),
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) users: Vec<User>,
    pub(crate) todos: Vec<Todo>,
    pub(crate) next_user_id: i64,
    pub(crate) next_todo_id: i64,
}

impl StoreState {
    fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut state = Self::default();
        for record in records {
            match record {
                Record::User(user) => state.users.push(user),
                Record::Todo(todo) => state.todos.push(todo),
            }
        }
        state.next_user_id = state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        state.next_todo_id = state.todos.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        state
    }
}

/// Users and to-dos, persisted to a single file
pub struct Store {
    file_path: PathBuf,
    pub(crate) state: RwLock<StoreState>,
}

impl Store {
    /// Load `file_path`, or start empty when it does not exist yet
    pub fn open(file_path: impl Into<PathBuf>) -> AppResult<Self> {
        let file_path = file_path.into();
        let state = Self::load(&file_path)?;

        info!(
            path = %file_path.display(),
            users = state.users.len(),
            todos = state.todos.len(),
            "store opened"
        );

        Ok(Self {
            file_path,
            state: RwLock::new(state),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load(file_path: &Path) -> AppResult<StoreState> {
        if !file_path.exists() {
            return Ok(StoreState::from_records(Vec::new()));
        }

        let content = fs::read_to_string(file_path)?;
        let records = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str::<Record>(line) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(line = index + 1, error = %err, "skipping unreadable record");
                    None
                }
            });

        Ok(StoreState::from_records(records))
    }

    /// Rewrite the data file; callers hold the write lock
    pub(crate) fn persist(&self, state: &StoreState) -> AppResult<()> {
        write_atomic(&self.file_path, |w| {
            for user in &state.users {
                serde_json::to_writer(&mut *w, &RecordRef::User(user))?;
                w.write_all(b"\n")?;
            }
            for todo in &state.todos {
                serde_json::to_writer(&mut *w, &RecordRef::Todo(todo))?;
                w.write_all(b"\n")?;
            }
            Ok(())
        })?;

        debug!(
            path = %self.file_path.display(),
            users = state.users.len(),
            todos = state.todos.len(),
            "store persisted"
        );
        Ok(())
    }
}
