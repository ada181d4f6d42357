use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("item is not a JSON object")]
    NotAnObject,
    #[error("invalid item: `{field}` must be {expected}")]
    Field {
        field: &'static str,
        expected: &'static str,
    },
}

impl ValidationError {
    fn field(field: &'static str, expected: &'static str) -> Self {
        Self::Field { field, expected }
    }
}

fn object<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    parent
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| ValidationError::field(field, "an object"))
}

fn string(
    parent: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<(), ValidationError> {
    match parent.get(key) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(ValidationError::field(field, "a string")),
    }
}

/// Lightweight structural check applied before an item is trusted.
pub fn validate_item(value: &Value) -> Result<(), ValidationError> {
    let root = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let meta = object(root, "meta", "meta")?;
    string(meta, "id", "meta.id")?;
    string(meta, "skill_id", "meta.skill_id")?;

    let content = object(root, "problem_content", "problem_content")?;
    string(content, "stem", "problem_content.stem")?;

    let solution = object(root, "solution_logic", "solution_logic")?;
    string(
        solution,
        "final_answer_canonical",
        "solution_logic.final_answer_canonical",
    )?;
    if !solution.get("steps").is_some_and(Value::is_array) {
        return Err(ValidationError::field("solution_logic.steps", "an array"));
    }

    object(root, "answer_spec", "answer_spec")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "meta": { "id": "p1", "skill_id": "add" },
            "problem_content": { "stem": "3 + 4 = ?" },
            "answer_spec": {},
            "solution_logic": { "final_answer_canonical": "7", "steps": [] }
        })
    }

    fn expect_field(value: Value, field: &str) {
        match validate_item(&value) {
            Err(ValidationError::Field { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected field error for {field}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_well_formed_item() {
        assert_eq!(validate_item(&valid()), Ok(()));
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(validate_item(&Value::Null), Err(ValidationError::NotAnObject));
        assert_eq!(validate_item(&json!([1, 2])), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn names_the_offending_field() {
        let mut v = valid();
        v["meta"]["id"] = json!(12);
        expect_field(v, "meta.id");

        let mut v = valid();
        v["meta"].as_object_mut().unwrap().remove("skill_id");
        expect_field(v, "meta.skill_id");

        let mut v = valid();
        v["problem_content"] = json!("text");
        expect_field(v, "problem_content");

        let mut v = valid();
        v["problem_content"]["stem"] = Value::Null;
        expect_field(v, "problem_content.stem");

        let mut v = valid();
        v["solution_logic"]["final_answer_canonical"] = json!(7);
        expect_field(v, "solution_logic.final_answer_canonical");

        let mut v = valid();
        v["solution_logic"]["steps"] = json!({});
        expect_field(v, "solution_logic.steps");

        let mut v = valid();
        v.as_object_mut().unwrap().remove("answer_spec");
        expect_field(v, "answer_spec");
    }

    #[test]
    fn error_message_is_descriptive() {
        let mut v = valid();
        v.as_object_mut().unwrap().remove("meta");
        let err = validate_item(&v).unwrap_err();
        assert_eq!(err.to_string(), "invalid item: `meta` must be an object");
    }
}
