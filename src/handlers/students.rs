use axum::{Json, extract::State};
use serde::Serialize;
use tracing::debug;

use crate::db::Student;
use crate::error::StudentError;
use crate::middleware::{StudentId, StudentPayload};
use crate::router::StudentsState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl MessageResponse {
    fn new(message: &'static str) -> Self {
        Self { message, id: None }
    }
}

/// GET / -> liveness string.
pub async fn health() -> &'static str {
    "Student API is running!"
}

/// GET /students -> every stored student.
pub async fn list_students(
    State(state): State<StudentsState>,
) -> Result<Json<Vec<Student>>, StudentError> {
    let students = state.storage.list().await?;
    debug!(count = students.len(), "students fetched");
    Ok(Json(students))
}

/// POST /students -> insert and return the new id.
pub async fn create_student(
    State(state): State<StudentsState>,
    StudentPayload(fields): StudentPayload,
) -> Result<Json<MessageResponse>, StudentError> {
    let id = state.storage.create(&fields).await?;
    Ok(Json(MessageResponse {
        message: "Student added",
        id: Some(id),
    }))
}

/// PUT /students/{id} -> overwrite all fields. An unknown id still reports success.
pub async fn update_student(
    State(state): State<StudentsState>,
    StudentId(id): StudentId,
    StudentPayload(fields): StudentPayload,
) -> Result<Json<MessageResponse>, StudentError> {
    state.storage.update(id, &fields).await?;
    Ok(Json(MessageResponse::new("Student updated")))
}

/// DELETE /students/{id} -> remove the row. Deleting twice is not an error.
pub async fn delete_student(
    State(state): State<StudentsState>,
    StudentId(id): StudentId,
) -> Result<Json<MessageResponse>, StudentError> {
    state.storage.delete(id).await?;
    Ok(Json(MessageResponse::new("Student deleted")))
}
