use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Locality, centre latitude, centre longitude, price scale.
const LOCALITIES: [(&str, f64, f64, f64); 6] = [
    ("New York", 40.7580, -73.9855, 2.4),
    ("Brooklyn", 40.6782, -73.9442, 1.6),
    ("Bronx County", 40.8448, -73.8648, 0.9),
    ("Queens", 40.7282, -73.7949, 1.1),
    ("Yonkers", 40.9312, -73.8988, 0.8),
    ("Albany", 42.6526, -73.7562, 0.6),
];

const TYPES: [&str; 5] = [
    "Condo for sale",
    "Co-op for sale",
    "House for sale",
    "Townhouse for sale",
    "Multi-family home for sale",
];

const STREETS: [&str; 6] = ["Main St", "Park Ave", "Broadway", "Elm St", "Ocean Pkwy", "Lake Rd"];

#[derive(Default)]
struct Columns {
    broker: Vec<String>,
    property_type: Vec<String>,
    price: Vec<Option<f64>>,
    beds: Vec<Option<i64>>,
    bath: Vec<Option<f64>>,
    sqft: Vec<Option<f64>>,
    address: Vec<String>,
    locality: Vec<Option<String>>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
}

fn generate(rng: &mut SimpleRng, count: usize) -> Columns {
    let mut cols = Columns::default();
    for i in 0..count {
        let &(locality, lat, lon, scale) = rng.pick(&LOCALITIES);
        let property_type = *rng.pick(&TYPES);
        let beds = (rng.range(1.0, 8.0).floor() as i64).max(1);
        let bath = (rng.range(1.0, beds as f64 + 1.0) * 2.0).floor() / 2.0;
        let sqft = (400.0 + beds as f64 * rng.range(250.0, 550.0)).round();
        let price = (sqft * rng.range(300.0, 900.0) * scale / 1_000.0).round() * 1_000.0;

        // Every 25th row is incomplete so the loader has something to drop.
        let incomplete = i % 25 == 24;

        cols.broker.push(format!("Brokered by Agency {}", i % 17));
        cols.property_type.push(property_type.to_string());
        cols.price.push(if incomplete && i % 2 == 0 { None } else { Some(price) });
        cols.beds.push(Some(beds));
        cols.bath.push(Some(bath));
        cols.sqft.push(if incomplete && i % 2 == 1 { None } else { Some(sqft) });
        cols.address.push(format!(
            "{} {}, {locality}, NY",
            10 + (rng.next_u64() % 990),
            rng.pick(&STREETS)
        ));
        cols.locality.push(Some(locality.to_string()));
        cols.latitude.push(lat + rng.range(-0.05, 0.05));
        cols.longitude.push(lon + rng.range(-0.05, 0.05));
    }
    cols
}

fn write_parquet(cols: &Columns, path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("BROKERTITLE", DataType::Utf8, false),
        Field::new("TYPE", DataType::Utf8, false),
        Field::new("PRICE", DataType::Float64, true),
        Field::new("BEDS", DataType::Int64, true),
        Field::new("BATH", DataType::Float64, true),
        Field::new("PROPERTYSQFT", DataType::Float64, true),
        Field::new("FORMATTED_ADDRESS", DataType::Utf8, false),
        Field::new("LOCALITY", DataType::Utf8, true),
        Field::new("LATITUDE", DataType::Float64, false),
        Field::new("LONGITUDE", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(cols.broker.clone())),
        Arc::new(StringArray::from(cols.property_type.clone())),
        Arc::new(Float64Array::from(cols.price.clone())),
        Arc::new(Int64Array::from(cols.beds.clone())),
        Arc::new(Float64Array::from(cols.bath.clone())),
        Arc::new(Float64Array::from(cols.sqft.clone())),
        Arc::new(StringArray::from(cols.address.clone())),
        Arc::new(StringArray::from(cols.locality.clone())),
        Arc::new(Float64Array::from(cols.latitude.clone())),
        Arc::new(Float64Array::from(cols.longitude.clone())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(cols: &Columns, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "BROKERTITLE",
        "TYPE",
        "PRICE",
        "BEDS",
        "BATH",
        "PROPERTYSQFT",
        "FORMATTED_ADDRESS",
        "LOCALITY",
        "LATITUDE",
        "LONGITUDE",
    ])?;

    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for i in 0..cols.address.len() {
        writer.write_record([
            cols.broker[i].clone(),
            cols.property_type[i].clone(),
            opt(cols.price[i]),
            cols.beds[i].map(|b| b.to_string()).unwrap_or_default(),
            opt(cols.bath[i]),
            opt(cols.sqft[i]),
            cols.address[i].clone(),
            cols.locality[i].clone().unwrap_or_default(),
            cols.latitude[i].to_string(),
            cols.longitude[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let cols = generate(&mut rng, 500);

    let parquet_path = "sample_listings.parquet";
    let csv_path = "sample_listings.csv";
    write_parquet(&cols, parquet_path)?;
    write_csv(&cols, csv_path)?;

    log::info!("Wrote {} rows to {parquet_path} and {csv_path}", cols.address.len());
    println!(
        "Wrote {} listings to {parquet_path} and {csv_path}",
        cols.address.len()
    );
    Ok(())
}
