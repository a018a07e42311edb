// Applies a parsed path to a message payload and pulls out the numeric weight vector.
// Slices expand to one item per element; filters keep matching items; fields map.

use serde_json::Value;

use crate::error::PanelError;
use crate::path::{Operand, ParsedPath, PathOp, SliceBound};
use crate::types::Message;

/// Extract the weight vector addressed by `path` from `message`.
///
/// Returns `Ok(None)` when the message is on another topic or the path selects
/// nothing. A payload whose shape does not fit the path is an extraction error.
pub fn extract_weights(message: &Message, path: &ParsedPath) -> Result<Option<Vec<f64>>, PanelError> {
    if message.topic != path.topic_name {
        return Ok(None);
    }

    let fail = |reason: String| PanelError::Extraction {
        topic: message.topic.clone(),
        message: reason,
    };

    let mut items: Vec<&Value> = vec![&message.message];
    for op in &path.ops {
        items = apply_op(op, items).map_err(fail)?;
    }

    match items.as_slice() {
        [] => Ok(None),
        [Value::Array(values)] => numbers(values).map(Some).map_err(fail),
        all if all.iter().all(|v| v.is_number()) => {
            Ok(Some(all.iter().filter_map(|v| v.as_f64()).collect()))
        }
        [single] => Err(fail(format!(
            "expected an array of numbers, found {}",
            kind(single)
        ))),
        many => Err(fail(format!("path produced {} results", many.len()))),
    }
}

fn apply_op<'a>(op: &PathOp, items: Vec<&'a Value>) -> Result<Vec<&'a Value>, String> {
    let mut out = Vec::with_capacity(items.len());

    match op {
        PathOp::Field(name) => {
            for item in items {
                match item {
                    Value::Object(map) => out.extend(map.get(name)),
                    Value::Null => {}
                    other => {
                        return Err(format!("cannot read field `{name}` of {}", kind(other)))
                    }
                }
            }
        }
        PathOp::Slice { start, end } => {
            for item in items {
                match item {
                    Value::Array(values) => {
                        if let Some((lo, hi)) = slice_range(start, end, values.len())? {
                            out.extend(&values[lo..=hi]);
                        }
                    }
                    Value::Null => {}
                    other => return Err(format!("cannot index into {}", kind(other))),
                }
            }
        }
        PathOp::Filter { path, value } => {
            let literal = match value {
                Operand::Literal(literal) => literal,
                Operand::Variable(var) => return Err(format!("unresolved variable ${var}")),
            };
            out.extend(
                items
                    .into_iter()
                    .filter(|item| lookup(item, path).is_some_and(|v| literal.matches(v))),
            );
        }
    }

    Ok(out)
}

/// Inclusive index range for a slice over `len` elements, or `None` if it selects nothing.
fn slice_range(
    start: &Option<SliceBound>,
    end: &Option<SliceBound>,
    len: usize,
) -> Result<Option<(usize, usize)>, String> {
    if len == 0 {
        return Ok(None);
    }
    let len = len as i64;
    let resolve = |bound: &Option<SliceBound>, open: i64| match bound {
        None => Ok(open),
        Some(SliceBound::Index(i)) if *i < 0 => Ok(len + i),
        Some(SliceBound::Index(i)) => Ok(*i),
        Some(SliceBound::Variable(var)) => Err(format!("unresolved variable ${var}")),
    };

    let lo = resolve(start, 0)?.max(0);
    let hi = resolve(end, len - 1)?.min(len - 1);
    if lo > hi {
        return Ok(None);
    }
    Ok(Some((lo as usize, hi as usize)))
}

fn lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

fn numbers(values: &[Value]) -> Result<Vec<f64>, String> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .ok_or_else(|| format!("element {i} is {}, expected a number", kind(v)))
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
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
    use crate::path::{MessagePathParser, PathParser};
    use crate::types::Time;
    use serde_json::json;

    fn extract(path: &str, payload: Value) -> Result<Option<Vec<f64>>, PanelError> {
        let path = MessagePathParser.parse(path).unwrap();
        let message = Message::new("/pie", Time::default(), payload);
        extract_weights(&message, &path)
    }

    #[test]
    fn numeric_array_field() {
        let weights = extract("/pie.data", json!({ "data": [1, 2.5, 3] })).unwrap();
        assert_eq!(weights, Some(vec![1.0, 2.5, 3.0]));
    }

    #[test]
    fn other_topic_is_ignored() {
        let weights = extract("/other.data", json!({ "data": [1] })).unwrap();
        assert_eq!(weights, None);
    }

    #[test]
    fn missing_field_selects_nothing() {
        assert_eq!(extract("/pie.nope", json!({ "data": [1] })).unwrap(), None);
    }

    #[test]
    fn slice_of_scalars_collects_in_order() {
        let weights = extract("/pie.data[1:]", json!({ "data": [9, 4, 5, 6] })).unwrap();
        assert_eq!(weights, Some(vec![4.0, 5.0, 6.0]));

        let last = extract("/pie.data[-1]", json!({ "data": [9, 4, 5, 6] })).unwrap();
        assert_eq!(last, Some(vec![6.0]));
    }

    #[test]
    fn filter_selects_matching_entry() {
        let payload = json!({
            "groups": [
                { "name": "cpu", "shares": [1, 2] },
                { "name": "mem", "shares": [3, 4, 5] },
            ]
        });
        let weights = extract(r#"/pie.groups[:]{name=="mem"}.shares"#, payload).unwrap();
        assert_eq!(weights, Some(vec![3.0, 4.0, 5.0]));
    }

    #[test]
    fn wrong_shape_is_extraction_error() {
        let err = extract("/pie.data", json!({ "data": "1,2,3" })).unwrap_err();
        assert!(matches!(err, PanelError::Extraction { .. }));
        assert!(err.to_string().contains("a string"));

        let err = extract("/pie.data.inner", json!({ "data": 4 })).unwrap_err();
        assert!(err.to_string().contains("field `inner`"));

        let err = extract("/pie.data", json!({ "data": [1, "x"] })).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn multiple_array_results_are_rejected() {
        let payload = json!({ "groups": [{ "v": [1] }, { "v": [2] }] });
        let err = extract("/pie.groups[:].v", payload).unwrap_err();
        assert!(err.to_string().contains("2 results"));
    }

    #[test]
    fn out_of_range_index_selects_nothing() {
        assert_eq!(extract("/pie.data[7]", json!({ "data": [1, 2] })).unwrap(), None);
    }
}
