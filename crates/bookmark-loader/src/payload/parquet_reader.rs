use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};

use crate::dataset::{Dataset, Row};

/// Read every row group of a Parquet file, converting values to JSON.
pub(super) fn read(data: Bytes) -> Result<Dataset, String> {
    let reader = SerializedFileReader::new(data).map_err(|e| e.to_string())?;

    let columns = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let mut dataset = Dataset::with_columns(columns);
    for row in reader.get_row_iter(None).map_err(|e| e.to_string())? {
        let row = row.map_err(|e| e.to_string())?;
        let values: Row = row
            .get_column_iter()
            .map(|(name, field)| (name.clone(), field.to_json_value()))
            .collect();
        dataset.push_row(values);
    }

    Ok(dataset)
}
