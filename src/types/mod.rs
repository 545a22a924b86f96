//! Data types for the to-do service
//!
//! Records stored by [`crate::store::Store`] and the request bodies the REST
//! layer accepts.

mod todo;
mod user;

pub use todo::{CreateTodo, DeletedTodo, Todo, UpdateTodo};
pub use user::{RegisterUser, User, UserView};
