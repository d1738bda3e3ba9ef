use std::sync::Arc;

use serde::Serialize;

use crate::config::ExplorerConfig;
use crate::data::aggregate::{
    self, cross_tab, group_stats, summarize, Aggregated, CrossTab, GroupStats, SummaryStats,
};
use crate::data::discretize::{build_range_with, slider_bounds, SliderBounds};
use crate::data::filter::{
    bath_options, bed_options, CategoryChoice, CountChoice, FilterCriteria, FilterError, ValueRange,
};
use crate::data::model::{CategoryColumn, Dataset, Listing, NumericColumn};
use crate::notes::locality_note;

// ---------------------------------------------------------------------------
// Selection options
// ---------------------------------------------------------------------------

/// Values offered by the selection controls, computed once per dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOptions {
    pub localities: Vec<String>,
    pub property_types: Vec<String>,
    pub beds: Vec<CountChoice<u32>>,
    pub baths: Vec<CountChoice<f64>>,
    pub prices: Vec<f64>,
    pub sqft: Option<SliderBounds>,
}

impl SelectionOptions {
    pub fn build(dataset: &Dataset, config: &ExplorerConfig) -> Result<Self, FilterError> {
        Ok(Self {
            localities: dataset.localities().iter().cloned().collect(),
            property_types: dataset.property_types().iter().cloned().collect(),
            beds: bed_options(config.bed_or_more),
            baths: bath_options(dataset),
            prices: build_range_with(
                dataset,
                NumericColumn::Price,
                config.price_step,
                config.price_percentile,
            )?,
            sqft: slider_bounds(
                dataset,
                NumericColumn::Sqft,
                config.sqft_percentile,
                config.sqft_step,
            )?,
        })
    }

    /// The widest selectable price range: first option to last option.
    pub fn full_price_range(&self) -> Option<ValueRange> {
        Some(ValueRange::new(*self.prices.first()?, *self.prices.last()?))
    }

    /// The full square footage slider span.
    pub fn full_sqft_range(&self) -> Option<ValueRange> {
        self.sqft.map(|b| ValueRange::new(b.min, b.max))
    }
}

// ---------------------------------------------------------------------------
// Query inputs
// ---------------------------------------------------------------------------

/// Listings in one locality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityQuery {
    pub locality: String,
    pub price: Option<ValueRange>,
    pub beds: CountChoice<u32>,
    pub bath: CountChoice<f64>,
    pub property_type: CategoryChoice,
}

/// Two localities side by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonQuery {
    pub first: String,
    pub second: String,
    pub price: Option<ValueRange>,
    pub beds: CountChoice<u32>,
}

/// Space offered per property type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpaceQuery {
    pub sqft: Option<ValueRange>,
    pub price: Option<ValueRange>,
}

// ---------------------------------------------------------------------------
// Query outputs
// ---------------------------------------------------------------------------

/// A filtered table with its summary.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<'a> {
    pub summary: Aggregated<SummaryStats>,
    pub listings: Vec<&'a Listing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityListings<'a> {
    pub locality: String,
    pub note: Option<&'static str>,
    pub summary: Aggregated<SummaryStats>,
    /// Matching listings, cheapest first.
    pub listings: Vec<&'a Listing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityComparison {
    /// Mean / median / count of PRICE per locality.
    pub price_by_locality: Vec<GroupStats>,
    /// Listing counts per locality and property type.
    pub type_counts: CrossTab,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSpace {
    pub property_type: String,
    pub mean_sqft: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView<'a> {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub points: Vec<&'a Listing>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One user's view of the shared, read-only dataset.
///
/// Cloning is cheap: the dataset is behind an `Arc` and never mutated, so
/// concurrent sessions need no locking and share no query state.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Arc<Dataset>,
    options: SelectionOptions,
}

impl Session {
    /// Start a session; selection options are computed from `dataset` here.
    pub fn new(dataset: Arc<Dataset>, config: &ExplorerConfig) -> Result<Self, FilterError> {
        let options = SelectionOptions::build(&dataset, config)?;
        log::debug!(
            "Session ready: {} listings, {} localities, {} price options",
            dataset.len(),
            options.localities.len(),
            options.prices.len()
        );
        Ok(Self { dataset, options })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Generic query: filtered rows in dataset order plus their summary.
    pub fn query(&self, criteria: &FilterCriteria) -> QueryResult<'_> {
        let subset = criteria.apply(&self.dataset);
        QueryResult {
            summary: summarize(&subset),
            listings: subset.iter().collect(),
        }
    }

    /// Homes in one locality, sorted by price.
    pub fn find_homes(&self, query: &CityQuery) -> CityListings<'_> {
        let criteria = FilterCriteria {
            locality: CategoryChoice::Exact(query.locality.clone()),
            property_type: query.property_type.clone(),
            price: query.price,
            beds: query.beds,
            bath: query.bath,
            sqft: None,
        };
        let subset = criteria.apply(&self.dataset);
        CityListings {
            locality: query.locality.clone(),
            note: locality_note(&query.locality),
            summary: summarize(&subset),
            listings: subset.sorted_by(NumericColumn::Price),
        }
    }

    /// Price statistics and type counts for two localities.
    pub fn compare_cities(&self, query: &ComparisonQuery) -> Aggregated<CityComparison> {
        let criteria = FilterCriteria {
            price: query.price,
            beds: query.beds,
            ..FilterCriteria::default()
        }
        .with_localities([query.first.as_str(), query.second.as_str()]);
        let subset = criteria.apply(&self.dataset);

        let stats = group_stats(&subset, CategoryColumn::Locality, NumericColumn::Price);
        let counts = cross_tab(&subset, CategoryColumn::Locality, CategoryColumn::PropertyType);
        match (stats, counts) {
            (Aggregated::Ready(price_by_locality), Aggregated::Ready(type_counts)) => {
                Aggregated::Ready(CityComparison {
                    price_by_locality,
                    type_counts,
                })
            }
            _ => Aggregated::NoData,
        }
    }

    /// Mean square footage per property type, roomiest first.
    pub fn space_by_type(&self, query: &SpaceQuery) -> Aggregated<Vec<TypeSpace>> {
        let criteria = FilterCriteria {
            price: query.price,
            sqft: query.sqft,
            ..FilterCriteria::default()
        };
        let subset = criteria.apply(&self.dataset);
        group_stats(&subset, CategoryColumn::PropertyType, NumericColumn::Sqft).map(|groups| {
            let mut space: Vec<TypeSpace> = groups
                .into_iter()
                .map(|g| TypeSpace {
                    property_type: g.key,
                    mean_sqft: g.mean,
                })
                .collect();
            space.sort_by(|a, b| b.mean_sqft.total_cmp(&a.mean_sqft));
            space
        })
    }

    /// Points to plot, centred on their mean position.
    pub fn map_view(&self, criteria: &FilterCriteria) -> Aggregated<MapView<'_>> {
        let subset = criteria.apply(&self.dataset);
        let latitude = aggregate::mean(&subset.values(NumericColumn::Latitude));
        let longitude = aggregate::mean(&subset.values(NumericColumn::Longitude));
        match latitude.zip(longitude) {
            Some((center_latitude, center_longitude)) => Aggregated::Ready(MapView {
                center_latitude,
                center_longitude,
                points: subset.iter().collect(),
            }),
            None => Aggregated::NoData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawListing;

    #[allow(clippy::too_many_arguments)]
    fn listing(
        locality: &str,
        property_type: &str,
        price: f64,
        beds: f64,
        bath: f64,
        sqft: f64,
        lat: f64,
        lon: f64,
    ) -> Listing {
        RawListing {
            price: Some(price),
            beds: Some(beds),
            bath: Some(bath),
            sqft: Some(sqft),
            locality: Some(locality.into()),
            latitude: Some(lat),
            longitude: Some(lon),
            property_type: Some(property_type.into()),
            address: Some(format!("{price} {locality}")),
        }
        .into_listing()
        .unwrap()
    }

    fn session() -> Session {
        let listings = vec![
            listing("Yonkers", "Condo for sale", 400_000.0, 2.0, 1.0, 900.0, 40.9, -73.9),
            listing("Yonkers", "House for sale", 250_000.0, 3.0, 2.0, 1_800.0, 40.9, -73.8),
            listing("Albany", "House for sale", 300_000.0, 6.0, 3.0, 2_400.0, 42.6, -73.7),
            listing("Albany", "Condo for sale", 200_000.0, 1.0, 1.0, 700.0, 42.6, -73.8),
            listing("New York", "Co-op for sale", 900_000.0, 2.0, 2.0, 1_000.0, 40.7, -74.0),
        ];
        let dataset = Arc::new(Dataset::from_listings(listings));
        Session::new(dataset, &ExplorerConfig::default()).unwrap()
    }

    #[test]
    fn options_follow_dataset() {
        let s = session();
        let opts = s.options();
        assert_eq!(opts.localities, vec!["Albany", "New York", "Yonkers"]);
        assert_eq!(opts.beds.len(), 7);
        assert_eq!(opts.prices.first(), Some(&200_000.0));
        assert!(opts.prices.iter().all(|p| p % 50_000.0 == 0.0));
        let sqft = opts.sqft.unwrap();
        assert_eq!(sqft.min, 700.0);
        assert_eq!(sqft.step, 50.0);
        let full = opts.full_price_range().unwrap();
        assert_eq!(full.min(), 200_000.0);
        assert_eq!(Some(&full.max()), opts.prices.last());
        let span = opts.full_sqft_range().unwrap();
        assert_eq!(span.min(), 700.0);
        assert_eq!(span.max(), sqft.max);
    }

    #[test]
    fn find_homes_sorts_by_price_and_attaches_note() {
        let s = session();
        let result = s.find_homes(&CityQuery {
            locality: "Yonkers".into(),
            ..CityQuery::default()
        });
        assert_eq!(result.note, Some("Known for affordable options"));
        let prices: Vec<f64> = result.listings.iter().map(|l| l.price()).collect();
        assert_eq!(prices, vec![250_000.0, 400_000.0]);
        let stats = result.summary.into_option().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.median_price, 325_000.0);
    }

    #[test]
    fn find_homes_in_unknown_locality_is_empty() {
        let s = session();
        let result = s.find_homes(&CityQuery {
            locality: "Nowhereville".into(),
            ..CityQuery::default()
        });
        assert!(result.summary.is_no_data());
        assert!(result.listings.is_empty());
        assert_eq!(result.note, None);
    }

    #[test]
    fn compare_two_cities() {
        let s = session();
        let cmp = s
            .compare_cities(&ComparisonQuery {
                first: "Yonkers".into(),
                second: "Albany".into(),
                ..ComparisonQuery::default()
            })
            .into_option()
            .unwrap();
        let keys: Vec<&str> = cmp.price_by_locality.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Albany", "Yonkers"]);
        assert_eq!(cmp.price_by_locality[0].mean, 250_000.0);
        assert_eq!(cmp.type_counts.cell_count(), 4);
        assert_eq!(cmp.type_counts.get("Albany", "Condo for sale"), Some(1));

        let none = s.compare_cities(&ComparisonQuery {
            first: "Yonkers".into(),
            second: "Albany".into(),
            beds: CountChoice::Exact(5),
            ..ComparisonQuery::default()
        });
        assert!(none.is_no_data());
    }

    #[test]
    fn space_by_type_sorted_descending() {
        let s = session();
        let space = s.space_by_type(&SpaceQuery::default()).into_option().unwrap();
        let types: Vec<&str> = space.iter().map(|t| t.property_type.as_str()).collect();
        assert_eq!(types, vec!["House for sale", "Co-op for sale", "Condo for sale"]);
        assert_eq!(space[0].mean_sqft, 2_100.0);

        let none = s.space_by_type(&SpaceQuery {
            sqft: Some(ValueRange::new(10_000.0, 20_000.0)),
            price: None,
        });
        assert!(none.is_no_data());
    }

    #[test]
    fn map_centres_on_mean_position() {
        let s = session();
        let view = s
            .map_view(&FilterCriteria::default().with_locality("Albany"))
            .into_option()
            .unwrap();
        assert_eq!(view.points.len(), 2);
        assert!((view.center_latitude - 42.6).abs() < 1e-9);
        assert!((view.center_longitude + 73.75).abs() < 1e-9);
    }

    #[test]
    fn sessions_share_one_dataset() {
        let s = session();
        let other = s.clone();
        assert!(std::ptr::eq(s.dataset(), other.dataset()));
        assert_eq!(s.query(&FilterCriteria::default()).listings.len(), 5);
    }
}
