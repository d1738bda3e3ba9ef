use std::fs::File;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use housing_explorer::{load_file, LoadError};

const CSV: &str = "\
BROKERTITLE,TYPE,PRICE,BEDS,BATH,PROPERTYSQFT,FORMATTED_ADDRESS,LOCALITY,LATITUDE,LONGITUDE
Brokered by A,Condo for sale,315000,2,2,1400,\"2 E 55th St, New York, NY\",New York,40.761255,-73.974483
Brokered by B,Condo for sale,195000,1,1,625,\"Central Park W, New York, NY\",New York,40.766393,-73.980991
Brokered by C,House for sale,260000,4,2,2015,\"620 Sinclair Ave, Staten Island, NY\",Richmond County,40.541805,-74.196109
Brokered by D,Co-op for sale,,3,1,1000,\"Missing price, Bronx, NY\",Bronx County,40.84,-73.86
Brokered by E,Co-op for sale,350000,3,1,0,\"Zero sqft, Bronx, NY\",Bronx County,40.84,-73.86
";

#[test]
fn loads_csv_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("NY-House-Dataset.csv");
    std::fs::write(&path, CSV).unwrap();

    let ds = load_file(&path).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.dropped(), 2);
    assert_eq!(
        ds.localities().iter().collect::<Vec<_>>(),
        vec!["New York", "Richmond County"]
    );
    assert!(ds.listings().iter().all(|l| l.price_per_sqft().is_finite()));
}

#[test]
fn loads_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listings.json");
    std::fs::write(
        &path,
        r#"[
            {"PRICE": 315000, "BEDS": 2.0, "BATH": 2, "PROPERTYSQFT": 1400,
             "LOCALITY": "New York", "TYPE": "Condo for sale",
             "LATITUDE": 40.76, "LONGITUDE": -73.97,
             "FORMATTED_ADDRESS": "2 E 55th St, New York, NY", "BROKERTITLE": "X"},
            {"PRICE": 195000, "BEDS": 1, "BATH": 1, "PROPERTYSQFT": 625,
             "LOCALITY": "New York", "TYPE": "Condo for sale",
             "LATITUDE": 40.76, "LONGITUDE": -73.98}
        ]"#,
    )
    .unwrap();

    let ds = load_file(&path).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.dropped(), 1);
}

#[test]
fn loads_parquet_file() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("PRICE", DataType::Float64, true),
        Field::new("BEDS", DataType::Int32, true),
        Field::new("BATH", DataType::Float64, true),
        Field::new("PROPERTYSQFT", DataType::Float64, true),
        Field::new("LOCALITY", DataType::Utf8, true),
        Field::new("LATITUDE", DataType::Float64, true),
        Field::new("LONGITUDE", DataType::Float64, true),
        Field::new("TYPE", DataType::Utf8, true),
        Field::new("FORMATTED_ADDRESS", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(vec![Some(500_000.0), None, Some(750_000.0)])),
        Arc::new(Int32Array::from(vec![3, 2, 6])),
        Arc::new(Float64Array::from(vec![2.5, 1.0, 3.0])),
        Arc::new(Float64Array::from(vec![1_000.0, 800.0, 2_500.0])),
        Arc::new(StringArray::from(vec!["Yonkers", "Yonkers", "Albany"])),
        Arc::new(Float64Array::from(vec![40.93, 40.94, 42.65])),
        Arc::new(Float64Array::from(vec![-73.89, -73.88, -73.75])),
        Arc::new(StringArray::from(vec!["Condo for sale", "Condo for sale", "House for sale"])),
        Arc::new(StringArray::from(vec!["1 A St", "2 B St", "3 C St"])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listings.parquet");
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_file(&path).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.dropped(), 1);
    let first = &ds.listings()[0];
    assert_eq!(first.bath(), 2.5);
    assert_eq!(first.beds(), 3);
    assert_eq!(first.price_per_sqft(), 500.0);
}

#[test]
fn parquet_missing_column_is_fatal() {
    let schema = Arc::new(Schema::new(vec![Field::new("PRICE", DataType::Float64, false)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Float64Array::from(vec![1.0])) as ArrayRef],
    )
    .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.pq");
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let err = load_file(&path).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn("BEDS")));
}

#[test]
fn unreadable_source_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.parquet");
    std::fs::write(&path, b"not a parquet file").unwrap();
    assert!(load_file(&path).is_err());

    let missing = dir.path().join("absent.csv");
    assert!(matches!(load_file(&missing), Err(LoadError::Open { .. })));
}
