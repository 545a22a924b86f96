use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/todos`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodo {
    #[serde(default)]
    pub title: String,
}

/// Body of `PUT /api/todos/:id`; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Payload announced on the `todo:deleted` hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedTodo {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_uses_camel_case() {
        let todo = Todo {
            id: 1,
            user_id: 7,
            title: "x".to_string(),
            completed: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["userId"], 7);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_deleted_payload_shape() {
        let json = serde_json::to_string(&DeletedTodo { id: 3 }).unwrap();
        assert_eq!(json, r#"{"id":3}"#);
    }
}
