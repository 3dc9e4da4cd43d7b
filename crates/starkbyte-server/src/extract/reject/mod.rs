//! Extractors whose rejections render as the crate's JSON error body.

mod enhanced_json;
mod enhanced_path;
mod enhanced_query;
mod validated_json;

pub use self::enhanced_json::Json;
pub use self::enhanced_path::Path;
pub use self::enhanced_query::Query;
pub use self::validated_json::ValidateJson;
use crate::handler::{Error, ErrorKind};

/// Longest rejection detail echoed back to the client.
const MAX_DETAIL_CHARS: usize = 200;

/// A 400 whose context is the first lines of axum's rejection text.
fn bad_request(message: &'static str, detail: &str) -> Error<'static> {
    let detail: String = detail
        .lines()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_DETAIL_CHARS)
        .collect();

    ErrorKind::BadRequest.with_message(message).with_context(detail)
}

/// Rejections axum may add in later releases.
fn unhandled(extractor: &'static str) -> Error<'static> {
    ErrorKind::InternalServerError.with_context(extractor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_single_line_and_bounded() {
        let detail = format!("first\nsecond\nthird\nfourth {}", "x".repeat(500));
        let error = bad_request("Malformed body", &detail);

        let context = error.context().unwrap_or_default();
        assert!(context.starts_with("first second third"));
        assert!(!context.contains("fourth"));
        assert_eq!(error.kind(), ErrorKind::BadRequest);

        let long = bad_request("Malformed body", &"y".repeat(500));
        assert_eq!(long.context().map(str::len), Some(MAX_DETAIL_CHARS));
    }
}
