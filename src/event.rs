//! Classification of a single JSON line into a build operation event.
//!
//! Begin: {"displayName": "...", "id": 1, "startTime": 10, "parentId": 0}
//! End:   {"id": 1, "endTime": 12}
//!
//! Anything else that is a JSON object is unrecognized; everything that is not
//! a JSON object is a parse failure.

use crate::hierarchy::{OperationId, OperationTime};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin {
        id: OperationId,
        display_name: String,
        start_time: OperationTime,
        parent_id: Option<OperationId>,
    },
    End {
        id: OperationId,
        end_time: OperationTime,
    },
    /// A JSON object that matches neither shape.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("not a JSON object: {0}")]
    ParseFailure(String),

    #[error("{shape} event is missing unsigned integer field `{field}`")]
    MissingRequiredField {
        shape: &'static str,
        field: &'static str,
    },
}

/// Raw line shape. Every field is optional and untyped so that a wrong type
/// degrades to a classification decision instead of a parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    display_name: Option<Value>,
    id: Option<Value>,
    start_time: Option<Value>,
    end_time: Option<Value>,
    parent_id: Option<Value>,
}

/// Classify one line of text.
pub fn classify(line: &str) -> Result<Event, ClassifyError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| ClassifyError::ParseFailure(e.to_string()))?;
    if !value.is_object() {
        return Err(ClassifyError::ParseFailure(format!(
            "expected an object, found {}",
            kind_of(&value)
        )));
    }
    let raw: RawEvent =
        serde_json::from_value(value).map_err(|e| ClassifyError::ParseFailure(e.to_string()))?;

    if let Some(display_name) = raw.display_name.as_ref().and_then(Value::as_str) {
        let id = required_uint(&raw.id, "begin", "id")?;
        let start_time = required_uint(&raw.start_time, "begin", "startTime")?;
        let parent_id = match &raw.parent_id {
            None | Some(Value::Null) => None,
            Some(v) => {
                let parent = v.as_u64();
                if parent.is_none() {
                    tracing::debug!(id, parent_id = %v, "ignoring non-integer parentId");
                }
                parent
            }
        };
        return Ok(Event::Begin {
            id,
            display_name: display_name.to_string(),
            start_time,
            parent_id,
        });
    }

    if let Some(end_time) = raw.end_time.as_ref().and_then(Value::as_u64) {
        let id = required_uint(&raw.id, "end", "id")?;
        return Ok(Event::End { id, end_time });
    }

    Ok(Event::Unrecognized)
}

fn required_uint(
    v: &Option<Value>,
    shape: &'static str,
    field: &'static str,
) -> Result<u64, ClassifyError> {
    v.as_ref()
        .and_then(Value::as_u64)
        .ok_or(ClassifyError::MissingRequiredField { shape, field })
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn begin_with_parent() {
        let e = classify(
            r#"{"displayName":"Load configuration cache state","id":88,"parentId":85,"startTime":2}"#,
        )
        .unwrap();
        assert_eq!(
            e,
            Event::Begin {
                id: 88,
                display_name: "Load configuration cache state".to_string(),
                start_time: 2,
                parent_id: Some(85),
            }
        );
    }

    #[test]
    fn begin_without_parent() {
        let e = classify(r#"{"displayName": "Run build", "id": 85, "startTime": 1}"#).unwrap();
        assert_eq!(
            e,
            Event::Begin {
                id: 85,
                display_name: "Run build".to_string(),
                start_time: 1,
                parent_id: None,
            }
        );
    }

    #[test]
    fn null_or_invalid_parent_is_absent() {
        for line in [
            r#"{"displayName":"a","id":1,"startTime":0,"parentId":null}"#,
            r#"{"displayName":"a","id":1,"startTime":0,"parentId":"7"}"#,
            r#"{"displayName":"a","id":1,"startTime":0,"parentId":-3}"#,
        ] {
            match classify(line).unwrap() {
                Event::Begin { parent_id, .. } => assert_eq!(parent_id, None, "{line}"),
                other => panic!("expected begin for {line}, got {other:?}"),
            }
        }
    }

    #[test]
    fn end_event() {
        let e = classify(r#"{"id": 88, "endTime": 4}"#).unwrap();
        assert_eq!(e, Event::End { id: 88, end_time: 4 });
    }

    #[test]
    fn begin_missing_start_time_is_malformed() {
        let err = classify(r#"{"displayName":"a","id":1}"#).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::MissingRequiredField {
                shape: "begin",
                field: "startTime"
            }
        );
    }

    #[test]
    fn begin_with_negative_id_is_malformed() {
        let err = classify(r#"{"displayName":"a","id":-1,"startTime":0}"#).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::MissingRequiredField {
                shape: "begin",
                field: "id"
            }
        );
    }

    #[test]
    fn end_missing_id_is_malformed() {
        let err = classify(r#"{"endTime": 4}"#).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::MissingRequiredField {
                shape: "end",
                field: "id"
            }
        );
    }

    #[test]
    fn non_string_display_name_falls_through_to_end() {
        let e = classify(r#"{"displayName": 5, "id": 3, "endTime": 9}"#).unwrap();
        assert_eq!(e, Event::End { id: 3, end_time: 9 });
    }

    #[test]
    fn unrecognized_objects() {
        assert_eq!(classify(r#"{"id": 1}"#).unwrap(), Event::Unrecognized);
        assert_eq!(classify(r#"{"id": 1, "endTime": 2.5}"#).unwrap(), Event::Unrecognized);
        assert_eq!(classify("{}").unwrap(), Event::Unrecognized);
    }

    #[test]
    fn non_objects_fail_to_parse() {
        for line in ["", "not json", "[1, 2]", "42", r#"{"id": 1"#] {
            assert!(
                matches!(classify(line), Err(ClassifyError::ParseFailure(_))),
                "{line:?}"
            );
        }
    }
}
