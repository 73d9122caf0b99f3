use crate::dataset::{Dataset, Row};

use super::infer_value;

/// Read a CSV payload with a header row.
///
/// Bytes are decoded as ISO-8859-1, so any input decodes; malformed CSV
/// (e.g. a record with a different field count than the header) is an error.
pub(super) fn read(data: &[u8]) -> Result<Dataset, String> {
    // ISO-8859-1 maps every byte to the code point with the same value.
    let text: String = data.iter().copied().map(char::from).collect();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();

    let mut dataset = Dataset::with_columns(headers.clone());
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| (column.clone(), infer_value(raw)))
            .collect();
        dataset.push_row(row);
    }

    Ok(dataset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_header_and_typed_cells() {
        let dataset = read(b"id,name,score\n1,alice,9.5\n2,bob,\n").unwrap();

        assert_eq!(dataset.columns(), ["id", "name", "score"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0]["id"], json!(1));
        assert_eq!(dataset.rows()[0]["score"], json!(9.5));
        assert_eq!(dataset.rows()[1]["name"], json!("bob"));
        assert_eq!(dataset.rows()[1]["score"], json!(null));
    }

    #[test]
    fn test_decodes_latin1() {
        // "café" with é encoded as the single byte 0xE9
        let dataset = read(b"word\ncaf\xe9\n").unwrap();
        assert_eq!(dataset.rows()[0]["word"], json!("café"));
    }

    #[test]
    fn test_ragged_record_is_an_error() {
        assert!(read(b"a,b\n1,2,3\n").is_err());
    }

    #[test]
    fn test_header_only_payload_has_no_rows() {
        let dataset = read(b"a,b\n").unwrap();
        assert_eq!(dataset.columns(), ["a", "b"]);
        assert!(dataset.is_empty());
    }
}
