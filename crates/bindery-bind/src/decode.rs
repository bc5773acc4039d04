//! Request body reading and strict JSON decoding.

use bindery_core::ApiError;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde::de::DeserializeOwned;
use serde_ignored::Path;

/// Boxed error type accepted from request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message sent when a function without input receives a body.
pub const EXPECTED_EMPTY_BODY: &str = "expected empty request body";

/// Decodes `bytes` into `T`, rejecting anything `T` does not declare.
///
/// Fails on unknown fields at any depth and on trailing data after the JSON
/// value. Trailing data is rejected on purpose, which is stricter than a
/// streaming decoder that stops after the first value.
///
/// Unknown fields are reported by path, e.g. ``unknown field `items[0].tag` ``.
///
/// A struct using `#[serde(flatten)]` is decoded by serde from a buffered
/// copy of its object, and keys nothing consumed are dropped there without
/// passing through this check. Unknown keys anywhere inside such a struct
/// are therefore accepted. Keys outside it are still rejected.
///
/// ```
/// use bindery_bind::decode::decode_strict;
///
/// #[derive(serde::Deserialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert!(decode_strict::<Point>(br#"{"x": 1, "y": 2}"#).is_ok());
/// assert!(decode_strict::<Point>(br#"{"x": 1, "y": 2, "z": 3}"#).is_err());
/// ```
///
/// # Errors
///
/// Returns a 400 [`ApiError`] carrying the decode failure.
pub fn decode_strict<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let mut unknown: Option<String> = None;

    let value: T = serde_ignored::deserialize(&mut deserializer, |path| {
        if unknown.is_none() {
            unknown = Some(render_path(&path));
        }
    })
    .map_err(|e| ApiError::bad_request(e.to_string()))?;

    if let Some(path) = unknown {
        return Err(ApiError::bad_request(format!("unknown field `{path}`")));
    }

    deserializer
        .end()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(value)
}

/// Renders a path the way a caller wrote it: `a.b`, `items[0]`.
/// Option and newtype wrappers do not appear in the JSON, so they are skipped.
fn render_path(path: &Path<'_>) -> String {
    match path {
        Path::Root => String::new(),
        Path::Seq { parent, index } => format!("{}[{index}]", render_path(parent)),
        Path::Map { parent, key } => {
            let parent = render_path(parent);
            if parent.is_empty() {
                key.clone()
            } else {
                format!("{parent}.{key}")
            }
        }
        Path::Some { parent }
        | Path::NewtypeStruct { parent }
        | Path::NewtypeVariant { parent } => render_path(parent),
    }
}

/// Reads the whole body, failing once it grows past `limit` bytes.
pub(crate) async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => Err(ApiError::payload_too_large(format!(
            "request body exceeds {limit} bytes"
        ))),
        Err(err) => Err(ApiError::bad_request(format!(
            "failed to read request body: {err}"
        ))),
    }
}

/// Succeeds only if the body carries no data.
///
/// Stops at the first data frame; a read error counts as data.
pub(crate) async fn ensure_empty<B>(body: B) -> Result<(), ApiError>
where
    B: Body<Data = Bytes>,
{
    let mut body = std::pin::pin!(body);
    while let Some(frame) = body.frame().await {
        let has_data = frame.map_or(true, |frame| {
            frame.data_ref().is_some_and(|data| !data.is_empty())
        });
        if has_data {
            return Err(ApiError::bad_request(EXPECTED_EMPTY_BODY));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::{Empty, Full, StreamBody};
    use hyper::body::Frame;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Note {
        title: String,
        tags: Vec<String>,
        author: Author,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Author {
        name: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Draft {
        cover: Option<Author>,
        sections: Vec<Section>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Section {
        heading: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Paging {
        limit: u32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Search {
        query: String,
        #[serde(flatten)]
        paging: Paging,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct SearchRequest {
        search: Search,
        trace: bool,
    }

    #[test]
    fn test_decode_known_fields() {
        let note: Note =
            decode_strict(br#"{"title":"t","tags":["a"],"author":{"name":"n"}}"#).unwrap();
        assert_eq!(note.title, "t");
        assert_eq!(note.author.name, "n");
    }

    #[test]
    fn test_decode_unknown_top_level_field() {
        let err = decode_strict::<Note>(
            br#"{"title":"t","tags":[],"author":{"name":"n"},"pinned":true}"#,
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "unknown field `pinned`");
    }

    #[test]
    fn test_decode_unknown_nested_field() {
        let err = decode_strict::<Note>(
            br#"{"title":"t","tags":[],"author":{"name":"n","email":"e"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "unknown field `author.email`");
    }

    #[test]
    fn test_unknown_field_path_skips_option() {
        let err = decode_strict::<Draft>(
            br#"{"cover":{"name":"n","color":"red"},"sections":[]}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "unknown field `cover.color`");
    }

    #[test]
    fn test_unknown_field_path_indexes_sequences() {
        let err = decode_strict::<Draft>(
            br#"{"cover":null,"sections":[{"heading":"a"},{"heading":"b","tag":"x"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "unknown field `sections[1].tag`");
    }

    #[test]
    fn test_flattened_struct_accepts_unknown_keys() {
        let search: Search = decode_strict(br#"{"query":"q","limit":5,"zzz":3}"#).unwrap();
        assert_eq!(search.paging, Paging { limit: 5 });
    }

    #[test]
    fn test_keys_outside_flattened_struct_still_checked() {
        let request: SearchRequest =
            decode_strict(br#"{"search":{"query":"q","limit":5},"trace":true}"#).unwrap();
        assert_eq!(request.search.query, "q");

        let err = decode_strict::<SearchRequest>(
            br#"{"search":{"query":"q","limit":5},"trace":true,"debug":1}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), "unknown field `debug`");
    }

    #[test]
    fn test_decode_trailing_data() {
        let err = decode_strict::<Author>(br#"{"name":"n"} {"name":"m"}"#).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("trailing"));
    }

    #[test]
    fn test_decode_trailing_whitespace_allowed() {
        assert!(decode_strict::<Author>(b"{\"name\":\"n\"}\n").is_ok());
    }

    #[test]
    fn test_decode_empty_body() {
        let err = decode_strict::<Author>(b"").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_decode_type_mismatch() {
        let err = decode_strict::<Author>(br#"{"name": 7}"#).unwrap_err();
        assert!(err.message().contains("invalid type"));
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body(Full::new(Bytes::from_static(b"hello")), 5)
            .await
            .unwrap();
        assert_eq!(bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let err = read_body(Full::new(Bytes::from_static(b"hello!")), 5)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_ensure_empty() {
        assert!(ensure_empty(Empty::<Bytes>::new()).await.is_ok());
        assert!(ensure_empty(Full::new(Bytes::new())).await.is_ok());

        let err = ensure_empty(Full::new(Bytes::from_static(b"{}")))
            .await
            .unwrap_err();
        assert_eq!(err.message(), EXPECTED_EMPTY_BODY);
    }

    #[tokio::test]
    async fn test_ensure_empty_read_error() {
        let frames: Vec<Result<Frame<Bytes>, std::io::Error>> =
            vec![Err(std::io::Error::other("connection reset"))];
        let body = StreamBody::new(futures_util::stream::iter(frames));
        let err = ensure_empty(body).await.unwrap_err();
        assert_eq!(err.message(), EXPECTED_EMPTY_BODY);
    }
}
