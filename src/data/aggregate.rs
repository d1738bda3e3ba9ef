use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{CategoryColumn, NumericColumn, Subset};

/// Result of an aggregation: statistics are undefined over zero rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
#[must_use]
pub enum Aggregated<T> {
    /// No listing matched; nothing was computed.
    NoData,
    Ready(T),
}

impl<T> Aggregated<T> {
    fn from_option(value: Option<T>) -> Self {
        value.map_or(Aggregated::NoData, Aggregated::Ready)
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Aggregated::NoData)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Aggregated::NoData => None,
            Aggregated::Ready(value) => Some(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Aggregated<U> {
        match self {
            Aggregated::NoData => Aggregated::NoData,
            Aggregated::Ready(value) => Aggregated::Ready(f(value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptive statistics over plain values
// ---------------------------------------------------------------------------

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Arithmetic mean; `None` for no values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value; the average of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let v = sorted(values);
    let n = v.len();
    Some(if n % 2 == 0 {
        (v[n / 2 - 1] + v[n / 2]) / 2.0
    } else {
        v[n / 2]
    })
}

/// Quantile `q` in `[0, 1]` with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let v = sorted(values);
    let pos = q * (v.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(v[lower] + (v[upper] - v[lower]) * frac)
}

// ---------------------------------------------------------------------------
// Summary of a filtered subset
// ---------------------------------------------------------------------------

/// Headline numbers for a filtered set of listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub median_price: f64,
    pub median_price_per_sqft: f64,
}

pub fn summarize(subset: &Subset<'_>) -> Aggregated<SummaryStats> {
    let prices = subset.values(NumericColumn::Price);
    let per_sqft = subset.values(NumericColumn::PricePerSqft);
    let stats = median(&prices).zip(median(&per_sqft)).map(|(price, ppsf)| SummaryStats {
        count: subset.len(),
        median_price: price,
        median_price_per_sqft: ppsf,
    });
    Aggregated::from_option(stats)
}

// ---------------------------------------------------------------------------
// Grouped statistics
// ---------------------------------------------------------------------------

/// Mean, median and count of one value column within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

/// Statistics of `value` for each distinct `group_by` value present, sorted by key.
pub fn group_stats(
    subset: &Subset<'_>,
    group_by: CategoryColumn,
    value: NumericColumn,
) -> Aggregated<Vec<GroupStats>> {
    if subset.is_empty() {
        return Aggregated::NoData;
    }

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for listing in subset.iter() {
        groups
            .entry(group_by.value(listing))
            .or_default()
            .push(value.value(listing));
    }

    let stats = groups
        .into_iter()
        .filter_map(|(key, values)| {
            Some(GroupStats {
                key: key.to_string(),
                mean: mean(&values)?,
                median: median(&values)?,
                count: values.len(),
            })
        })
        .collect();
    Aggregated::Ready(stats)
}

// ---------------------------------------------------------------------------
// Cross tabulation
// ---------------------------------------------------------------------------

/// Dense count matrix keyed by two categorical columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_column: CategoryColumn,
    pub col_column: CategoryColumn,
    /// Sorted labels observed in the row column.
    pub row_labels: Vec<String>,
    /// Sorted labels observed in the column column.
    pub col_labels: Vec<String>,
    /// `counts[r][c]` for `row_labels[r]` × `col_labels[c]`; absent pairs are 0.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    /// Count for one (row, column) label pair; `None` if either label was not observed.
    pub fn get(&self, row: &str, col: &str) -> Option<usize> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.col_labels.iter().position(|l| l == col)?;
        Some(self.counts[r][c])
    }

    pub fn cell_count(&self) -> usize {
        self.row_labels.len() * self.col_labels.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

pub fn cross_tab(
    subset: &Subset<'_>,
    rows: CategoryColumn,
    cols: CategoryColumn,
) -> Aggregated<CrossTab> {
    if subset.is_empty() {
        return Aggregated::NoData;
    }

    let row_labels: Vec<String> = subset
        .iter()
        .map(|l| rows.value(l))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let col_labels: Vec<String> = subset
        .iter()
        .map(|l| cols.value(l))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut counts = vec![vec![0usize; col_labels.len()]; row_labels.len()];
    for listing in subset.iter() {
        let r = row_labels.binary_search_by(|l| l.as_str().cmp(rows.value(listing)));
        let c = col_labels.binary_search_by(|l| l.as_str().cmp(cols.value(listing)));
        if let (Ok(r), Ok(c)) = (r, c) {
            counts[r][c] += 1;
        }
    }

    Aggregated::Ready(CrossTab {
        row_column: rows,
        col_column: cols,
        row_labels,
        col_labels,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, Listing, RawListing};

    fn listing(locality: &str, property_type: &str, price: f64, sqft: f64) -> Listing {
        RawListing {
            price: Some(price),
            beds: Some(2.0),
            bath: Some(1.0),
            sqft: Some(sqft),
            locality: Some(locality.into()),
            latitude: Some(40.7),
            longitude: Some(-73.9),
            property_type: Some(property_type.into()),
            address: Some("somewhere".into()),
        }
        .into_listing()
        .unwrap()
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[400.0, 100.0, 300.0, 200.0]), Some(250.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn percentile_interpolates() {
        let v: Vec<f64> = (1..=11).map(f64::from).collect();
        assert_eq!(percentile(&v, 0.5), Some(6.0));
        assert_eq!(percentile(&v, 0.95), Some(10.5));
        assert_eq!(percentile(&v, 0.0), Some(1.0));
        assert_eq!(percentile(&v, 1.0), Some(11.0));
        assert_eq!(percentile(&v, 1.5), None);
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn summary_medians() {
        let ds = Dataset::from_listings(vec![
            listing("A", "Condo", 100.0, 1.0),
            listing("A", "Condo", 200.0, 1.0),
            listing("B", "House", 300.0, 1.0),
            listing("B", "House", 400.0, 2.0),
        ]);
        let Aggregated::Ready(stats) = summarize(&ds.all()) else {
            panic!("expected statistics");
        };
        assert_eq!(stats.count, 4);
        assert_eq!(stats.median_price, 250.0);
        assert_eq!(stats.median_price_per_sqft, 200.0);
    }

    #[test]
    fn empty_subset_has_no_data() {
        let ds = Dataset::from_listings(vec![listing("A", "Condo", 100.0, 1.0)]);
        let empty = ds.all().retain(|_| false);
        assert!(summarize(&empty).is_no_data());
        assert!(group_stats(&empty, CategoryColumn::Locality, NumericColumn::Price).is_no_data());
        assert!(cross_tab(&empty, CategoryColumn::Locality, CategoryColumn::PropertyType)
            .is_no_data());
    }

    #[test]
    fn groups_sorted_by_key() {
        let ds = Dataset::from_listings(vec![
            listing("Yonkers", "Condo", 300.0, 1.0),
            listing("Albany", "Condo", 100.0, 1.0),
            listing("Albany", "House", 300.0, 1.0),
            listing("Yonkers", "House", 500.0, 1.0),
            listing("Yonkers", "House", 700.0, 1.0),
        ]);
        let groups = group_stats(&ds.all(), CategoryColumn::Locality, NumericColumn::Price)
            .into_option()
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "Albany");
        assert_eq!((groups[0].mean, groups[0].median, groups[0].count), (200.0, 200.0, 2));
        assert_eq!(groups[1].key, "Yonkers");
        assert_eq!((groups[1].mean, groups[1].median, groups[1].count), (500.0, 500.0, 3));
    }

    #[test]
    fn cross_tab_fills_absent_pairs_with_zero() {
        let ds = Dataset::from_listings(vec![
            listing("Albany", "Condo", 1.0, 1.0),
            listing("Albany", "Condo", 1.0, 1.0),
            listing("Yonkers", "House", 1.0, 1.0),
        ]);
        let tab = cross_tab(&ds.all(), CategoryColumn::Locality, CategoryColumn::PropertyType)
            .into_option()
            .unwrap();
        assert_eq!(tab.cell_count(), 4);
        assert_eq!(tab.get("Albany", "Condo"), Some(2));
        assert_eq!(tab.get("Albany", "House"), Some(0));
        assert_eq!(tab.get("Yonkers", "Condo"), Some(0));
        assert_eq!(tab.get("Yonkers", "House"), Some(1));
        assert_eq!(tab.get("Nowhere", "House"), None);
        assert_eq!(tab.total(), 3);
    }
}
