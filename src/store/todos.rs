//! To-do items, always scoped to their owner

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::types::{Todo, UpdateTodo};

use super::Store;

fn validate_title(title: &str) -> AppResult<String> {
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    Ok(title.to_string())
}

fn not_found() -> AppError {
    AppError::NotFound("todo not found".to_string())
}

impl Store {
    /// The user's to-dos in creation order
    pub fn list_todos(&self, user_id: i64) -> Vec<Todo> {
        let mut todos: Vec<Todo> = self
            .state
            .read()
            .todos
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        todos.sort_by_key(|t| t.id);
        todos
    }

    pub fn get_todo(&self, user_id: i64, id: i64) -> AppResult<Todo> {
        self.state
            .read()
            .todos
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned()
            .ok_or_else(not_found)
    }

    pub fn create_todo(&self, user_id: i64, title: &str) -> AppResult<Todo> {
        let title = validate_title(title)?;
        let mut state = self.state.write();

        let todo = Todo {
            id: state.next_todo_id,
            user_id,
            title,
            completed: false,
            created_at: Utc::now(),
        };
        state.todos.push(todo.clone());

        if let Err(err) = self.persist(&state) {
            state.todos.pop();
            return Err(err);
        }
        state.next_todo_id += 1;
        Ok(todo)
    }

    /// Apply the fields present in `patch`; a supplied title is stored as given
    pub fn update_todo(&self, user_id: i64, id: i64, patch: UpdateTodo) -> AppResult<Todo> {
        let mut state = self.state.write();

        let index = state
            .todos
            .iter()
            .position(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(not_found)?;
        let previous = state.todos[index].clone();

        let todo = &mut state.todos[index];
        if let Some(title) = patch.title {
            todo.title = title;
        }
        if let Some(completed) = patch.completed {
            todo.completed = completed;
        }
        let updated = todo.clone();

        if let Err(err) = self.persist(&state) {
            state.todos[index] = previous;
            return Err(err);
        }
        Ok(updated)
    }

    pub fn delete_todo(&self, user_id: i64, id: i64) -> AppResult<()> {
        let mut state = self.state.write();

        let index = state
            .todos
            .iter()
            .position(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(not_found)?;
        let removed = state.todos.remove(index);

        if let Err(err) = self.persist(&state) {
            state.todos.insert(index, removed);
            return Err(err);
        }
        Ok(())
    }
}
