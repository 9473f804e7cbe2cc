//! Typed command payloads
//!
//! Every request accepts its dual-form fields through [`JsonOrText`], which
//! is resolved exactly once (`decode`) before any core logic runs.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::embedding::EmbeddingSet;
use crate::stats::NumericSample;
use crate::{Error, Result};

/// A field that may arrive as structured JSON or as JSON-encoded text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonOrText<T> {
    /// Already-parsed JSON
    Structured(T),
    /// JSON document carried as a string
    Text(String),
}

impl<T: DeserializeOwned> JsonOrText<T> {
    /// Resolve to the structured form, parsing text if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the text is not valid JSON for `T`.
    pub fn decode(self) -> Result<T> {
        match self {
            Self::Structured(value) => Ok(value),
            Self::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }

    /// True for empty text (`""`), which callers treat like a missing field.
    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

/// `test_normal` payload: `{ "data": [..] }` or `{ "data": "[..]" }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TestNormalRequest {
    /// Sample values
    #[serde(default)]
    pub data: Option<JsonOrText<Vec<Value>>>,
}

impl TestNormalRequest {
    /// Request from typed values
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            data: Some(JsonOrText::Structured(
                values.iter().map(|&v| Value::from(v)).collect(),
            )),
        }
    }

    /// Validate into a [`NumericSample`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `data` is missing, empty, not JSON,
    /// or contains non-numeric values.
    pub fn into_sample(self) -> Result<NumericSample> {
        let values = match self.data {
            Some(data) if !data.is_blank() => data.decode()?,
            _ => return Err(Error::Validation("No data provided".to_string())),
        };
        NumericSample::from_json_values(&values)
    }
}

/// `read_h5` payload: `{ "h5_bytes": "<base64>" }`
///
/// `h5_bytes` must hold a container produced by `write_h5`; HDF5 files are
/// not readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReadH5Request {
    /// Base64-encoded container
    #[serde(default)]
    pub h5_bytes: Option<String>,
}

impl ReadH5Request {
    /// Base64 text of the container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `h5_bytes` is missing.
    pub fn into_base64(self) -> Result<String> {
        self.h5_bytes
            .ok_or_else(|| Error::Validation("No h5_bytes provided".to_string()))
    }
}

/// `read_h5` result: `original_id → vector`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadH5Response {
    /// Vectors keyed by their stored `original_id`
    pub id2emb: BTreeMap<String, Vec<f64>>,
}

/// `write_h5` payload: `{ "embeddings": "{\"id\": [..]}" }`
///
/// `compress` is optional and defaults to `true`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WriteH5Request {
    /// Mapping id → vector, structured or as JSON text
    #[serde(default)]
    pub embeddings: Option<JsonOrText<Map<String, Value>>>,
    /// Whether to compress vector chunks
    #[serde(default)]
    pub compress: Option<bool>,
}

impl WriteH5Request {
    /// Request from typed vectors
    #[must_use]
    pub fn from_vectors<'a, I>(vectors: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        let map = vectors
            .into_iter()
            .map(|(id, vector)| {
                let values = vector.iter().map(|&v| Value::from(v)).collect();
                (id.to_string(), Value::Array(values))
            })
            .collect();
        Self {
            embeddings: Some(JsonOrText::Structured(map)),
            compress: None,
        }
    }

    /// Whether compression was requested (default `true`)
    #[must_use]
    pub fn compress(&self) -> bool {
        self.compress.unwrap_or(true)
    }

    /// Validate into an [`EmbeddingSet`] with `original_id == key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `embeddings` is missing, empty, not a
    /// JSON object, or any vector holds a non-numeric value.
    pub fn into_set(self) -> Result<EmbeddingSet> {
        let map = match self.embeddings {
            Some(embeddings) if !embeddings.is_blank() => embeddings.decode()?,
            _ => return Err(Error::Validation("No embeddings provided".to_string())),
        };
        if map.is_empty() {
            return Err(Error::Validation("No embeddings provided".to_string()));
        }

        let vectors = map
            .into_iter()
            .map(|(id, value)| {
                let vector = json_vector(&id, &value)?;
                Ok((id, vector))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EmbeddingSet::from_vectors(vectors))
    }
}

fn json_vector(id: &str, value: &Value) -> Result<Vec<f64>> {
    let items = value.as_array().ok_or_else(|| {
        Error::Validation(format!("Embedding '{id}' must be an array of numbers"))
    })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
                Error::Validation(format!(
                    "Embedding '{id}' has a non-numeric value at index {index}: {item}"
                ))
            })
        })
        .collect()
}

/// `write_h5` result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteH5Response {
    /// Base64-encoded container
    pub h5_bytes: String,
}

/// Deserialize a request, treating a `null` payload as an empty request.
pub(crate) fn from_payload<T: DeserializeOwned + Default>(payload: Value) -> Result<T> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload)
        .map_err(|e| Error::Validation(format!("Invalid request payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_or_text_structured() {
        let field: JsonOrText<Vec<f64>> = serde_json::from_value(json!([1.0, 2.0])).unwrap();
        assert_eq!(field, JsonOrText::Structured(vec![1.0, 2.0]));
        assert_eq!(field.decode().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_json_or_text_text() {
        let field: JsonOrText<Vec<f64>> = serde_json::from_value(json!("[1.0, 2.0]")).unwrap();
        assert!(matches!(field, JsonOrText::Text(_)));
        assert_eq!(field.decode().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_json_or_text_bad_text() {
        let field: JsonOrText<Vec<f64>> = JsonOrText::Text("not valid json".to_string());
        assert!(matches!(field.decode(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_test_normal_both_forms() {
        let structured: TestNormalRequest =
            from_payload(json!({"data": [1, 2, 3.5]})).unwrap();
        let text: TestNormalRequest = from_payload(json!({"data": "[1, 2, 3.5]"})).unwrap();
        assert_eq!(
            structured.into_sample().unwrap(),
            text.into_sample().unwrap()
        );
    }

    #[test]
    fn test_test_normal_missing_data() {
        for payload in [json!({}), json!(null), json!({"data": null}), json!({"data": ""}), json!({"data": []}), json!({"data": "[]"})] {
            let request: TestNormalRequest = from_payload(payload.clone()).unwrap();
            let err = request.into_sample().unwrap_err();
            assert_eq!(err.message(), "No data provided", "{payload}");
        }
    }

    #[test]
    fn test_test_normal_from_values() {
        let sample = TestNormalRequest::from_values(&[1.0, 2.0, 4.0]).into_sample().unwrap();
        assert_eq!(sample.values(), &[1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_test_normal_wrong_shape() {
        let result: Result<TestNormalRequest> = from_payload(json!({"data": 5}));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_read_h5_missing_bytes() {
        let request: ReadH5Request = from_payload(json!({})).unwrap();
        assert_eq!(request.into_base64().unwrap_err().message(), "No h5_bytes provided");
    }

    #[test]
    fn test_write_h5_text_form() {
        let request: WriteH5Request =
            from_payload(json!({"embeddings": "{\"a\": [1, 2], \"b\": [0.5]}"})).unwrap();
        assert!(request.compress());
        let set = request.into_set().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").unwrap().vector(), &[1.0, 2.0]);
        assert_eq!(set.get("b").unwrap().original_id(), "b");
    }

    #[test]
    fn test_write_h5_structured_form_and_compress_flag() {
        let request: WriteH5Request =
            from_payload(json!({"embeddings": {"a": [1.5]}, "compress": false})).unwrap();
        assert!(!request.compress());
        assert_eq!(request.into_set().unwrap().get("a").unwrap().vector(), &[1.5]);
    }

    #[test]
    fn test_write_h5_invalid() {
        let cases = [
            (json!({"embeddings": "not valid json"}), "Invalid JSON"),
            (json!({"embeddings": "[1, 2]"}), "Invalid JSON"),
            (json!({"embeddings": "{}"}), "No embeddings provided"),
            (json!({}), "No embeddings provided"),
            (json!({"embeddings": {"a": "x"}}), "must be an array"),
            (json!({"embeddings": {"a": [1, "2"]}}), "index 1"),
        ];
        for (payload, expected) in cases {
            let request: WriteH5Request = from_payload(payload.clone()).unwrap();
            let err = request.into_set().unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{payload}");
            assert!(err.to_string().contains(expected), "{payload}: {err}");
        }
    }

    #[test]
    fn test_write_h5_from_vectors() {
        let a = [1.0, 2.0];
        let request = WriteH5Request::from_vectors([("seq_42", &a[..])]);
        let set = request.into_set().unwrap();
        assert_eq!(set.get("seq_42").unwrap().vector(), &a);
    }
}
