use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde_json::{Map, Value};

use crate::db::StudentFields;
use crate::error::StudentError;

const REQUIRED_FIELDS: [&str; 4] = ["name", "age", "grade", "email"];

/// JSON body carrying all four student fields, validated before storage is touched.
///
/// Every key must be present; partial bodies are rejected rather than merged.
pub struct StudentPayload(pub StudentFields);

impl<S> FromRequest<S> for StudentPayload
where
    S: Send + Sync,
{
    type Rejection = StudentError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| StudentError::malformed(rejection.body_text()))?;
        parse_fields(&body).map(StudentPayload)
    }
}

/// Integer `{id}` path segment.
pub struct StudentId(pub i64);

impl<S> FromRequestParts<S> for StudentId
where
    S: Send + Sync,
{
    type Rejection = StudentError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| StudentError::malformed(rejection.body_text()))?;
        raw.parse::<i64>()
            .map(StudentId)
            .map_err(|_| StudentError::malformed(format!("invalid student id `{raw}`")))
    }
}

pub fn parse_fields(body: &Value) -> Result<StudentFields, StudentError> {
    let obj = body
        .as_object()
        .ok_or_else(|| StudentError::malformed("request body must be a JSON object"))?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|k| !obj.contains_key(**k)) {
        return Err(StudentError::malformed(format!("missing field `{missing}`")));
    }

    Ok(StudentFields {
        name: name_field(obj)?,
        age: age_field(obj)?,
        grade: grade_field(obj)?,
        email: email_field(obj)?,
    })
}

fn name_field(obj: &Map<String, Value>) -> Result<String, StudentError> {
    match &obj["name"] {
        Value::String(s) => Ok(s.clone()),
        _ => Err(StudentError::malformed("field `name` must be a string")),
    }
}

// Browser forms submit numbers as strings, so numeric text is accepted too.
fn age_field(obj: &Map<String, Value>) -> Result<Option<i64>, StudentError> {
    let invalid = || StudentError::malformed("field `age` must be an integer or null");
    match &obj["age"] {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn grade_field(obj: &Map<String, Value>) -> Result<Option<String>, StudentError> {
    match &obj["grade"] {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(StudentError::malformed(
            "field `grade` must be a string, number or null",
        )),
    }
}

// A blank email is stored as NULL so it never trips the UNIQUE constraint.
fn email_field(obj: &Map<String, Value>) -> Result<Option<String>, StudentError> {
    match &obj["email"] {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(StudentError::malformed("field `email` must be a string or null")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail(err: StudentError) -> String {
        match err {
            StudentError::MalformedRequest(d) => d,
            other => panic!("expected malformed request, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_payload() {
        let fields = parse_fields(&json!({
            "name": "A", "age": 10, "grade": "5", "email": "a@x.com"
        }))
        .unwrap();
        assert_eq!(
            fields,
            StudentFields {
                name: "A".into(),
                age: Some(10),
                grade: Some("5".into()),
                email: Some("a@x.com".into()),
            }
        );
    }

    #[test]
    fn each_missing_key_is_reported() {
        for key in REQUIRED_FIELDS {
            let mut body = json!({"name": "A", "age": 1, "grade": "2", "email": "e@x"});
            body.as_object_mut().unwrap().remove(key);
            let msg = detail(parse_fields(&body).unwrap_err());
            assert_eq!(msg, format!("missing field `{key}`"));
        }
    }

    #[test]
    fn null_optional_fields_are_present_but_empty() {
        let fields =
            parse_fields(&json!({"name": "B", "age": null, "grade": null, "email": null})).unwrap();
        assert_eq!(fields.age, None);
        assert_eq!(fields.grade, None);
        assert_eq!(fields.email, None);
    }

    #[test]
    fn form_style_strings_are_coerced() {
        let fields =
            parse_fields(&json!({"name": "C", "age": " 12 ", "grade": 7, "email": "  "})).unwrap();
        assert_eq!(fields.age, Some(12));
        assert_eq!(fields.grade.as_deref(), Some("7"));
        assert_eq!(fields.email, None);

        let fields = parse_fields(&json!({"name": "C", "age": "", "grade": "", "email": ""})).unwrap();
        assert_eq!(fields.age, None);
        assert_eq!(fields.grade.as_deref(), Some(""));
    }

    #[test]
    fn non_blank_email_is_kept_verbatim() {
        let fields =
            parse_fields(&json!({"name": "D", "age": 1, "grade": "1", "email": " d@x.com "})).unwrap();
        assert_eq!(fields.email.as_deref(), Some(" d@x.com "));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let bad = [
            json!({"name": null, "age": 1, "grade": "x", "email": "e"}),
            json!({"name": "n", "age": "ten", "grade": "x", "email": "e"}),
            json!({"name": "n", "age": 1.5, "grade": "x", "email": "e"}),
            json!({"name": "n", "age": 1, "grade": ["x"], "email": "e"}),
            json!({"name": "n", "age": 1, "grade": "x", "email": 3}),
        ];
        for body in bad {
            assert!(matches!(
                parse_fields(&body),
                Err(StudentError::MalformedRequest(_))
            ));
        }
    }

    #[test]
    fn non_object_body_is_rejected() {
        let msg = detail(parse_fields(&json!(["A", 10])).unwrap_err());
        assert_eq!(msg, "request body must be a JSON object");
    }
}
