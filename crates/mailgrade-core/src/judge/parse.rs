use crate::errors::EvalError;
use crate::model::{Rating, MAX_RATING};

/// Parses judge output into a [`Rating`].
///
/// The whole reply, after trimming, must be one JSON object with an integer
/// `rating` in `0..=3` and a string `reasoning`. The only wrapper allowed is a
/// single Markdown code fence around the object (```` ```json ```` or
/// ```` ``` ````). Prose before or after the object, or more than one value,
/// is rejected.
pub fn parse_rating(raw: &str) -> Result<Rating, EvalError> {
    let fail = |reason: String| EvalError::judge_parse(raw, reason);

    let text = strip_fence(raw.trim());
    if text.is_empty() {
        return Err(fail("no JSON object found".into()));
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| fail(format!("invalid JSON: {}", e)))?;

    let obj = value
        .as_object()
        .ok_or_else(|| fail("judge output is not a JSON object".into()))?;

    let rating = obj
        .get("rating")
        .ok_or_else(|| fail("missing 'rating' field".into()))?;
    let rating = match rating.as_i64() {
        Some(n) => n,
        None if rating.is_u64() => i64::MAX,
        None => return Err(fail(format!("'rating' is not an integer: {}", rating))),
    };
    if !(0..=i64::from(MAX_RATING)).contains(&rating) {
        return Err(fail(format!(
            "'rating' {} is outside 0..={}",
            rating, MAX_RATING
        )));
    }

    let reasoning = obj
        .get("reasoning")
        .ok_or_else(|| fail("missing 'reasoning' field".into()))?
        .as_str()
        .ok_or_else(|| fail("'reasoning' is not a string".into()))?;

    Ok(Rating {
        rating: rating as u8,
        reasoning: reasoning.to_string(),
    })
}

/// Removes one surrounding code fence; text without a complete fence is returned as is.
fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    if !body.starts_with(['\n', '\r']) {
        return text;
    }
    body.trim()
}
