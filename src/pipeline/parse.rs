use serde_json::Value;
use tracing::{debug, error, trace};

use crate::backend::strip_code_fence;
use crate::error::GenerationError;
use crate::model::{NOT_AVAILABLE, Recommendation};

/// Parse a model response into recommendations, in the order given.
///
/// The text may be wrapped in a Markdown code fence. It must be a JSON
/// object with a non-empty `recommendations` array whose elements each carry
/// a non-empty `title`; a missing `description` or `reasoning` becomes
/// [`NOT_AVAILABLE`]. Errors keep the untouched `raw_text`.
pub fn parse_recommendations(raw_text: &str) -> Result<Vec<Recommendation>, GenerationError> {
    let json_text = strip_code_fence(raw_text);
    trace!(json = %json_text, "Attempting to parse response as JSON");

    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        error!(error = %e, raw_text = %raw_text, "JSON parsing error");
        GenerationError::MalformedJson {
            raw_text: raw_text.to_string(),
            message: e.to_string(),
        }
    })?;

    let schema_mismatch = |message: String| {
        error!(reason = %message, raw_text = %raw_text, "Schema mismatch");
        GenerationError::SchemaMismatch {
            raw_text: raw_text.to_string(),
            message,
        }
    };

    let items = match value.get("recommendations") {
        None => return Err(schema_mismatch("missing `recommendations` key".to_string())),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(schema_mismatch("`recommendations` is not a list".to_string())),
    };
    if items.is_empty() {
        return Err(schema_mismatch("`recommendations` is empty".to_string()));
    }

    let recommendations = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item))
        .collect::<Result<Vec<_>, _>>()
        .map_err(schema_mismatch)?;

    debug!(count = recommendations.len(), "Parsed recommendations");
    Ok(recommendations)
}

fn parse_item(index: usize, item: &Value) -> Result<Recommendation, String> {
    if !item.is_object() {
        return Err(format!("recommendation {} is not an object", index + 1));
    }

    let title = text_field(item, "title")
        .ok_or_else(|| format!("recommendation {} has no `title`", index + 1))?;

    Ok(Recommendation {
        title: title.to_string(),
        description: text_field(item, "description")
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        reasoning: text_field(item, "reasoning")
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
    })
}

fn text_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
