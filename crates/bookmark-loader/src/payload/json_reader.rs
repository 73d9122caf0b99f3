use serde_json::Value;

use crate::dataset::Dataset;

/// Read a JSON payload: an array of objects, a single object, or
/// newline-delimited objects (JSON Lines).
pub(super) fn read(data: &[u8]) -> Result<Dataset, String> {
    let text = std::str::from_utf8(data).map_err(|e| e.to_string())?;

    let values: Vec<Value> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text).map_err(|e| e.to_string())?
    } else {
        serde_json::Deserializer::from_str(text)
            .into_iter::<Value>()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?
    };

    let mut dataset = Dataset::new();
    for (index, value) in values.into_iter().enumerate() {
        match value {
            Value::Object(row) => dataset.push_row(row),
            other => {
                return Err(format!(
                    "record {} is not a JSON object: {}",
                    index, other
                ))
            },
        }
    }

    Ok(dataset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_array_of_objects() {
        let dataset = read(br#"[{"id": 1, "name": "a"}, {"id": 2, "extra": true}]"#).unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.columns().contains(&"extra".to_string()));
        assert_eq!(dataset.rows()[1]["extra"], json!(true));
    }

    #[test]
    fn test_reads_json_lines() {
        let dataset = read(b"{\"id\": 1}\n{\"id\": 2}\n\n{\"id\": 3}\n").unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows()[2]["id"], json!(3));
    }

    #[test]
    fn test_rejects_scalars() {
        let err = read(b"[1, 2]").unwrap_err();
        assert!(err.contains("record 0"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(read(b"{\"id\": ").is_err());
    }
}
