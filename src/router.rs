use axum::{
    Router,
    routing::{get, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::StudentStorage;
use crate::handlers::students::{
    create_student, delete_student, health, list_students, update_student,
};

#[derive(Clone)]
pub struct StudentsState {
    pub storage: StudentStorage,
}

impl StudentsState {
    pub fn new(storage: StudentStorage) -> Self {
        Self { storage }
    }
}

pub fn students_router(state: StudentsState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            put(update_student).delete(delete_student),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
