use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{
    Dataset, RawListing, Rejection, BATH, BEDS, FORMATTED_ADDRESS, LATITUDE, LOCALITY, LONGITUDE,
    PRICE, PROPERTY_SQFT, REQUIRED_COLUMNS, TYPE,
};

/// Failure to produce a dataset from a listings source. Fatal for the session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("required column {0} is absent")]
    MissingColumn(&'static str),
    #[error("row {row}: {column} value {value:?} is invalid")]
    Malformed {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("column {column} has unsupported type {data_type}")]
    UnexpectedType {
        column: &'static str,
        data_type: String,
    },
    #[error("expected a top-level JSON array of records")]
    NotRecords,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the source column names
/// * `.json`    – `[{ "PRICE": 500000, "BEDS": 3, ... }, ...]`, `null` for missing
/// * `.parquet` – one column per source field (recommended for large files)
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let open = || {
        File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })
    };

    let dataset = match ext.as_str() {
        "csv" => load_csv_reader(BufReader::new(open()?))?,
        "json" => load_json_reader(BufReader::new(open()?))?,
        "parquet" | "pq" => load_parquet_file(open()?)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} listings from {} ({} rows dropped)",
        dataset.len(),
        path.display(),
        dataset.dropped()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row assembly shared by every format
// ---------------------------------------------------------------------------

/// Validate raw rows, drop incomplete ones and build the dataset.
fn assemble(rows: Vec<RawListing>) -> Result<Dataset, LoadError> {
    let mut listings = Vec::with_capacity(rows.len());
    let mut dropped: BTreeMap<String, usize> = BTreeMap::new();

    for (row, raw) in rows.into_iter().enumerate() {
        match raw.into_listing() {
            Ok(listing) => listings.push(listing),
            Err(Rejection::NegativeBeds(value)) => {
                return Err(LoadError::Malformed {
                    row,
                    column: BEDS,
                    value: value.to_string(),
                });
            }
            Err(reason) => *dropped.entry(reason.to_string()).or_default() += 1,
        }
    }

    for (reason, count) in &dropped {
        log::debug!("Dropped {count} rows: {reason}");
    }
    if let Some(count) = dropped.get(&Rejection::NonPositiveSqft.to_string()) {
        log::warn!("Dropped {count} rows with zero square footage");
    }

    let total_dropped = dropped.values().sum();
    Ok(Dataset::from_listings(listings).with_dropped(total_dropped))
}

fn check_columns<'h>(present: impl IntoIterator<Item = &'h str>) -> Result<(), LoadError> {
    let present: BTreeSet<&str> = present.into_iter().collect();
    match REQUIRED_COLUMNS.iter().find(|c| !present.contains(*c)) {
        Some(missing) => Err(LoadError::MissingColumn(*missing)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; extra columns are ignored.
/// Empty cells count as missing. A non-numeric value in a numeric column is an error.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::Reader::from_reader(reader);
    check_columns(reader.headers()?.iter())?;

    let rows = reader
        .deserialize::<RawListing>()
        .collect::<Result<Vec<_>, _>>()?;

    assemble(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "PRICE": 315000, "BEDS": 2, "BATH": 2, "PROPERTYSQFT": 1400,
///     "LOCALITY": "New York", "TYPE": "Condo for sale",
///     "LATITUDE": 40.76, "LONGITUDE": -73.97,
///     "FORMATTED_ADDRESS": "2 E 55th St Unit 803, New York, NY 10022, USA"
///   },
///   ...
/// ]
/// ```
///
/// A required key must appear in at least one record; `null` or an absent key
/// in a single record makes that record incomplete.
pub fn load_json_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_reader(reader)?;
    let JsonValue::Array(records) = root else {
        return Err(LoadError::NotRecords);
    };

    if !records.is_empty() {
        let mut keys = BTreeSet::new();
        for record in &records {
            let obj = record.as_object().ok_or(LoadError::NotRecords)?;
            keys.extend(obj.keys().map(String::as_str));
        }
        check_columns(keys)?;
    }

    let rows = records
        .into_iter()
        .map(serde_json::from_value::<RawListing>)
        .collect::<Result<Vec<_>, _>>()?;

    assemble(rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing listings.
///
/// Numeric columns may be Int32, Int64, Float32 or Float64; text columns
/// Utf8 or LargeUtf8. Nulls count as missing. Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
pub fn load_parquet_file(file: File) -> Result<Dataset, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    check_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        read_batch(&batch?, &mut rows)?;
    }

    assemble(rows)
}

fn read_batch(batch: &RecordBatch, rows: &mut Vec<RawListing>) -> Result<(), LoadError> {
    let price = column(batch, PRICE)?;
    let beds = column(batch, BEDS)?;
    let bath = column(batch, BATH)?;
    let sqft = column(batch, PROPERTY_SQFT)?;
    let locality = column(batch, LOCALITY)?;
    let latitude = column(batch, LATITUDE)?;
    let longitude = column(batch, LONGITUDE)?;
    let property_type = column(batch, TYPE)?;
    let address = column(batch, FORMATTED_ADDRESS)?;

    for row in 0..batch.num_rows() {
        rows.push(RawListing {
            price: numeric_cell(price, row, PRICE)?,
            beds: numeric_cell(beds, row, BEDS)?,
            bath: numeric_cell(bath, row, BATH)?,
            sqft: numeric_cell(sqft, row, PROPERTY_SQFT)?,
            locality: text_cell(locality, row, LOCALITY)?,
            latitude: numeric_cell(latitude, row, LATITUDE)?,
            longitude: numeric_cell(longitude, row, LONGITUDE)?,
            property_type: text_cell(property_type, row, TYPE)?,
            address: text_cell(address, row, FORMATTED_ADDRESS)?,
        });
    }
    Ok(())
}

// -- Arrow helpers --

fn column<'b>(batch: &'b RecordBatch, name: &'static str) -> Result<&'b ArrayRef, LoadError> {
    batch
        .schema_ref()
        .index_of(name)
        .map(|i| batch.column(i))
        .map_err(|_| LoadError::MissingColumn(name))
}

/// Read one numeric cell as `f64`; `None` for null.
fn numeric_cell(
    col: &ArrayRef,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, LoadError> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        DataType::Float32 => f64::from(col.as_primitive::<Float32Type>().value(row)),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::Int32 => f64::from(col.as_primitive::<Int32Type>().value(row)),
        other => {
            return Err(LoadError::UnexpectedType {
                column,
                data_type: format!("{other:?}"),
            })
        }
    };
    Ok(Some(value))
}

/// Read one text cell; `None` for null.
fn text_cell(
    col: &ArrayRef,
    row: usize,
    column: &'static str,
) -> Result<Option<String>, LoadError> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row),
        other => {
            return Err(LoadError::UnexpectedType {
                column,
                data_type: format!("{other:?}"),
            })
        }
    };
    Ok(Some(value.to_string()))
}
