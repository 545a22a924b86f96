//! User accounts

use crate::error::{AppError, AppResult};
use crate::types::{User, UserView};

use super::Store;

impl Store {
    /// Add an account; usernames are unique
    pub fn create_user(&self, username: &str, password_hash: String) -> AppResult<User> {
        let mut state = self.state.write();
        if state.users.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict("user already exists".to_string()));
        }

        let user = User {
            id: state.next_user_id,
            username: username.to_string(),
            password_hash,
        };
        state.users.push(user.clone());

        if let Err(err) = self.persist(&state) {
            state.users.pop();
            return Err(err);
        }
        state.next_user_id += 1;
        Ok(user)
    }

    pub fn find_user(&self, username: &str) -> Option<User> {
        self.state
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn get_user(&self, id: i64) -> AppResult<User> {
        self.state
            .read()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    pub fn list_users(&self) -> Vec<UserView> {
        self.state.read().users.iter().map(UserView::from).collect()
    }
}
