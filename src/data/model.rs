use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const PRICE: &str = "PRICE";
pub const BEDS: &str = "BEDS";
pub const BATH: &str = "BATH";
pub const PROPERTY_SQFT: &str = "PROPERTYSQFT";
pub const LOCALITY: &str = "LOCALITY";
pub const LATITUDE: &str = "LATITUDE";
pub const LONGITUDE: &str = "LONGITUDE";
pub const TYPE: &str = "TYPE";
pub const FORMATTED_ADDRESS: &str = "FORMATTED_ADDRESS";

/// Columns every listings source must carry. A row missing any of them is dropped.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    PRICE,
    BEDS,
    BATH,
    PROPERTY_SQFT,
    LOCALITY,
    LATITUDE,
    LONGITUDE,
    TYPE,
    FORMATTED_ADDRESS,
];

// ---------------------------------------------------------------------------
// RawListing – one source row before validation
// ---------------------------------------------------------------------------

/// A source row as read from CSV / JSON / Parquet. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawListing {
    #[serde(rename = "PRICE")]
    pub price: Option<f64>,
    #[serde(rename = "BEDS")]
    pub beds: Option<f64>,
    #[serde(rename = "BATH")]
    pub bath: Option<f64>,
    #[serde(rename = "PROPERTYSQFT")]
    pub sqft: Option<f64>,
    #[serde(rename = "LOCALITY")]
    pub locality: Option<String>,
    #[serde(rename = "LATITUDE")]
    pub latitude: Option<f64>,
    #[serde(rename = "LONGITUDE")]
    pub longitude: Option<f64>,
    #[serde(rename = "TYPE")]
    pub property_type: Option<String>,
    #[serde(rename = "FORMATTED_ADDRESS")]
    pub address: Option<String>,
}

/// Why a [`RawListing`] did not become a [`Listing`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// A required cell is empty, null or not a finite number.
    Missing(&'static str),
    /// Square footage of zero or less; price per sqft would be undefined.
    NonPositiveSqft,
    /// A negative bed count cannot be truncated to a whole number of rooms.
    NegativeBeds(f64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Missing(column) => write!(f, "missing {column}"),
            Rejection::NonPositiveSqft => write!(f, "{PROPERTY_SQFT} is not positive"),
            Rejection::NegativeBeds(v) => write!(f, "{BEDS} is negative ({v})"),
        }
    }
}

fn number(value: Option<f64>, column: &'static str) -> Result<f64, Rejection> {
    value
        .filter(|v| v.is_finite())
        .ok_or(Rejection::Missing(column))
}

fn text(value: Option<String>, column: &'static str) -> Result<String, Rejection> {
    value
        .filter(|s| !s.is_empty())
        .ok_or(Rejection::Missing(column))
}

impl RawListing {
    /// Validate the row and compute its derived fields.
    ///
    /// Beds are truncated toward zero; bath is kept exactly as parsed.
    pub fn into_listing(self) -> Result<Listing, Rejection> {
        let price = number(self.price, PRICE)?;
        let beds = number(self.beds, BEDS)?;
        let bath = number(self.bath, BATH)?;
        let sqft = number(self.sqft, PROPERTY_SQFT)?;
        let locality = text(self.locality, LOCALITY)?;
        let latitude = number(self.latitude, LATITUDE)?;
        let longitude = number(self.longitude, LONGITUDE)?;
        let property_type = text(self.property_type, TYPE)?;
        let address = text(self.address, FORMATTED_ADDRESS)?;

        if beds < 0.0 {
            return Err(Rejection::NegativeBeds(beds));
        }
        if sqft <= 0.0 {
            return Err(Rejection::NonPositiveSqft);
        }

        Ok(Listing {
            address,
            price,
            beds: beds.trunc() as u32,
            bath,
            sqft,
            locality,
            property_type,
            latitude,
            longitude,
            price_per_sqft: price / sqft,
        })
    }
}

// ---------------------------------------------------------------------------
// Listing – one validated property record
// ---------------------------------------------------------------------------

/// One property listing. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    #[serde(rename = "FORMATTED_ADDRESS")]
    address: String,
    #[serde(rename = "PRICE")]
    price: f64,
    #[serde(rename = "BEDS")]
    beds: u32,
    #[serde(rename = "BATH")]
    bath: f64,
    #[serde(rename = "PROPERTYSQFT")]
    sqft: f64,
    #[serde(rename = "LOCALITY")]
    locality: String,
    #[serde(rename = "TYPE")]
    property_type: String,
    #[serde(rename = "LATITUDE")]
    latitude: f64,
    #[serde(rename = "LONGITUDE")]
    longitude: f64,
    #[serde(rename = "PRICE_PER_SQFT")]
    price_per_sqft: f64,
}

impl Listing {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn beds(&self) -> u32 {
        self.beds
    }

    pub fn bath(&self) -> f64 {
        self.bath
    }

    pub fn sqft(&self) -> f64 {
        self.sqft
    }

    pub fn locality(&self) -> &str {
        &self.locality
    }

    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Price divided by square footage, computed once at load.
    pub fn price_per_sqft(&self) -> f64 {
        self.price_per_sqft
    }
}

// ---------------------------------------------------------------------------
// Column selectors
// ---------------------------------------------------------------------------

/// A numeric attribute of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NumericColumn {
    Price,
    Beds,
    Bath,
    Sqft,
    PricePerSqft,
    Latitude,
    Longitude,
}

impl NumericColumn {
    /// Source column name.
    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::Price => PRICE,
            NumericColumn::Beds => BEDS,
            NumericColumn::Bath => BATH,
            NumericColumn::Sqft => PROPERTY_SQFT,
            NumericColumn::PricePerSqft => "PRICE_PER_SQFT",
            NumericColumn::Latitude => LATITUDE,
            NumericColumn::Longitude => LONGITUDE,
        }
    }

    pub fn value(self, listing: &Listing) -> f64 {
        match self {
            NumericColumn::Price => listing.price,
            NumericColumn::Beds => f64::from(listing.beds),
            NumericColumn::Bath => listing.bath,
            NumericColumn::Sqft => listing.sqft,
            NumericColumn::PricePerSqft => listing.price_per_sqft,
            NumericColumn::Latitude => listing.latitude,
            NumericColumn::Longitude => listing.longitude,
        }
    }
}

/// A categorical attribute of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CategoryColumn {
    Locality,
    PropertyType,
    Address,
}

impl CategoryColumn {
    /// Source column name.
    pub fn name(self) -> &'static str {
        match self {
            CategoryColumn::Locality => LOCALITY,
            CategoryColumn::PropertyType => TYPE,
            CategoryColumn::Address => FORMATTED_ADDRESS,
        }
    }

    pub fn value(self, listing: &Listing) -> &str {
        match self {
            CategoryColumn::Locality => &listing.locality,
            CategoryColumn::PropertyType => &listing.property_type,
            CategoryColumn::Address => &listing.address,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// All listings that survived loading, with pre-computed category indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    listings: Vec<Listing>,
    localities: BTreeSet<String>,
    property_types: BTreeSet<String>,
    dropped: usize,
}

impl Dataset {
    /// Build category indices from validated listings.
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        let localities = listings.iter().map(|l| l.locality.clone()).collect();
        let property_types = listings.iter().map(|l| l.property_type.clone()).collect();
        Dataset {
            listings,
            localities,
            property_types,
            dropped: 0,
        }
    }

    /// Record how many source rows were discarded while loading.
    #[must_use]
    pub fn with_dropped(mut self, dropped: usize) -> Self {
        self.dropped = dropped;
        self
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Number of source rows dropped at load time.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Sorted distinct localities.
    pub fn localities(&self) -> &BTreeSet<String> {
        &self.localities
    }

    /// Sorted distinct property types.
    pub fn property_types(&self) -> &BTreeSet<String> {
        &self.property_types
    }

    /// A view over every listing.
    pub fn all(&self) -> Subset<'_> {
        Subset {
            dataset: self,
            indices: (0..self.listings.len()).collect(),
        }
    }

    /// All values of a numeric column, in row order.
    pub fn values(&self, column: NumericColumn) -> Vec<f64> {
        self.listings.iter().map(|l| column.value(l)).collect()
    }
}

// ---------------------------------------------------------------------------
// Subset – a filtered view over a dataset
// ---------------------------------------------------------------------------

/// Indices of the listings that passed a chain of filters.
///
/// Indices stay in ascending row order, so two subsets holding the same rows
/// compare equal no matter which order the filters ran in.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl PartialEq for Subset<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dataset, other.dataset) && self.indices == other.indices
    }
}

impl<'a> Subset<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Listing> + '_ {
        let dataset: &'a Dataset = self.dataset;
        let listings = &dataset.listings;
        self.indices.iter().map(move |&i| &listings[i])
    }

    /// Keep only the listings matching `predicate`.
    #[must_use]
    pub fn retain(mut self, predicate: impl Fn(&Listing) -> bool) -> Self {
        let dataset: &'a Dataset = self.dataset;
        let listings = &dataset.listings;
        self.indices.retain(|&i| predicate(&listings[i]));
        self
    }

    /// Values of a numeric column for the listings in this subset.
    pub fn values(&self, column: NumericColumn) -> Vec<f64> {
        self.iter().map(|l| column.value(l)).collect()
    }

    /// Listings ordered by a numeric column, ascending. Ties keep row order.
    pub fn sorted_by(&self, column: NumericColumn) -> Vec<&'a Listing> {
        let mut rows: Vec<&Listing> = self.iter().collect();
        rows.sort_by(|a, b| column.value(a).total_cmp(&column.value(b)));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawListing {
        RawListing {
            price: Some(500_000.0),
            beds: Some(3.0),
            bath: Some(2.5),
            sqft: Some(1_250.0),
            locality: Some("Brooklyn".into()),
            latitude: Some(40.65),
            longitude: Some(-73.95),
            property_type: Some("Condo for sale".into()),
            address: Some("1 Main St, Brooklyn, NY".into()),
        }
    }

    #[test]
    fn derives_price_per_sqft() {
        let listing = raw().into_listing().unwrap();
        assert_eq!(listing.price_per_sqft(), 400.0);
        assert_eq!(listing.bath(), 2.5);
    }

    #[test]
    fn truncates_fractional_beds() {
        let listing = RawListing {
            beds: Some(2.9),
            ..raw()
        }
        .into_listing()
        .unwrap();
        assert_eq!(listing.beds(), 2);
    }

    #[test]
    fn rejects_missing_fields() {
        let r = RawListing {
            locality: None,
            ..raw()
        };
        assert_eq!(r.into_listing(), Err(Rejection::Missing(LOCALITY)));

        let r = RawListing {
            address: Some(String::new()),
            ..raw()
        };
        assert_eq!(r.into_listing(), Err(Rejection::Missing(FORMATTED_ADDRESS)));

        let r = RawListing {
            price: Some(f64::NAN),
            ..raw()
        };
        assert_eq!(r.into_listing(), Err(Rejection::Missing(PRICE)));
    }

    #[test]
    fn rejects_zero_sqft_and_negative_beds() {
        let r = RawListing {
            sqft: Some(0.0),
            ..raw()
        };
        assert_eq!(r.into_listing(), Err(Rejection::NonPositiveSqft));

        let r = RawListing {
            beds: Some(-1.0),
            ..raw()
        };
        assert_eq!(r.into_listing(), Err(Rejection::NegativeBeds(-1.0)));
    }

    #[test]
    fn dataset_indexes_categories() {
        let a = raw().into_listing().unwrap();
        let b = RawListing {
            locality: Some("Albany".into()),
            property_type: Some("House for sale".into()),
            ..raw()
        }
        .into_listing()
        .unwrap();
        let ds = Dataset::from_listings(vec![a.clone(), b, a]);
        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.localities().iter().collect::<Vec<_>>(),
            vec!["Albany", "Brooklyn"]
        );
        assert_eq!(ds.property_types().len(), 2);
        assert_eq!(ds.all().indices(), &[0, 1, 2]);
    }

    #[test]
    fn sorted_by_price_is_stable() {
        let cheap = RawListing {
            price: Some(100.0),
            ..raw()
        }
        .into_listing()
        .unwrap();
        let dear = raw().into_listing().unwrap();
        let ds = Dataset::from_listings(vec![dear.clone(), cheap.clone(), dear]);
        let sorted = ds.all().sorted_by(NumericColumn::Price);
        assert_eq!(sorted[0].price(), 100.0);
        assert_eq!(sorted.len(), 3);
    }
}
