use serde::Serialize;
use sqlx::FromRow;

/// One row of the `students` table, serialized as-is in list responses.
#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
    pub grade: Option<String>,
    pub email: Option<String>,
}

/// The four caller-supplied columns. Create and update both take the full set.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFields {
    pub name: String,
    pub age: Option<i64>,
    pub grade: Option<String>,
    pub email: Option<String>,
}

impl StudentFields {
    pub fn into_student(self, id: i64) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            grade: self.grade,
            email: self.email,
        }
    }
}
