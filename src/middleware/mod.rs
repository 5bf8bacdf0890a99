pub mod student_request;

pub use student_request::{StudentId, StudentPayload};
