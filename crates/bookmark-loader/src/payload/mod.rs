//! Payload decoding
//!
//! Turns raw object bytes into a [`Dataset`] according to the job's declared
//! format. Every failure is reported as `PayloadReadFailed` carrying the
//! object's path.

use bookmark_common::{BookmarkError, DataFormat, Result};
use bytes::Bytes;
use serde_json::{Number, Value};

use crate::dataset::Dataset;

mod csv_reader;
mod json_reader;
mod parquet_reader;

/// Decode `data` read from `path` as `format`.
pub fn decode(path: &str, format: DataFormat, data: Bytes) -> Result<Dataset> {
    let decoded = match format {
        DataFormat::Csv => csv_reader::read(&data),
        DataFormat::Json => json_reader::read(&data),
        DataFormat::Parquet => parquet_reader::read(data),
        DataFormat::Xml => Err("no reader is available for xml payloads".to_string()),
    };

    decoded.map_err(|reason| BookmarkError::payload(path, reason))
}

/// Type a textual cell the way a CSV reader with type inference would:
/// integers, then floats, otherwise the raw string. Empty cells are null.
pub(crate) fn infer_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }

    if let Some(float) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_value() {
        assert_eq!(infer_value(""), Value::Null);
        assert_eq!(infer_value("42"), json!(42));
        assert_eq!(infer_value("-3.5"), json!(-3.5));
        assert_eq!(infer_value("NaN"), json!("NaN"));
        assert_eq!(infer_value("job_123"), json!("job_123"));
    }

    #[test]
    fn test_xml_has_no_reader() {
        let err =
            decode("data/a.xml", DataFormat::Xml, Bytes::from_static(b"<rows/>")).unwrap_err();

        match err {
            BookmarkError::PayloadReadFailed { path, reason } => {
                assert_eq!(path, "data/a.xml");
                assert!(reason.contains("xml"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
