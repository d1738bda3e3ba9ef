use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::model::{Dataset, Listing, Subset};

/// A user-supplied criterion that could not be understood.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("{0:?} is not a number")]
    InvalidNumber(String),
    #[error("{0:?} is not a count choice (expected \"Any\", \"N\" or \"N or more\")")]
    InvalidChoice(String),
    #[error("step must be a positive finite number, got {0}")]
    InvalidStep(f64),
    #[error("percentile must lie in [0, 1], got {0}")]
    InvalidPercentile(f64),
    #[error("range would offer more than {0} options")]
    TooManyOptions(usize),
}

// ---------------------------------------------------------------------------
// Typed choices
// ---------------------------------------------------------------------------

/// Equality constraint on a categorical attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum CategoryChoice {
    #[default]
    Any,
    Exact(String),
    OneOf(BTreeSet<String>),
}

impl CategoryChoice {
    /// Build from a selector label; "Any", "All areas" and blank mean no constraint.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty()
            || label.eq_ignore_ascii_case("any")
            || label.eq_ignore_ascii_case("all areas")
        {
            CategoryChoice::Any
        } else {
            CategoryChoice::Exact(label.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            CategoryChoice::Any => true,
            CategoryChoice::Exact(want) => want == value,
            CategoryChoice::OneOf(set) => set.contains(value),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, CategoryChoice::Any)
    }
}

/// Bed / bath count selection: no constraint, an exact count, or a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum CountChoice<T> {
    #[default]
    Any,
    Exact(T),
    OrMore(T),
}

impl<T: PartialOrd> CountChoice<T> {
    pub fn matches(&self, value: T) -> bool {
        match self {
            CountChoice::Any => true,
            CountChoice::Exact(n) => value == *n,
            CountChoice::OrMore(n) => value >= *n,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, CountChoice::Any)
    }
}

impl<T: fmt::Display> fmt::Display for CountChoice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountChoice::Any => write!(f, "Any"),
            CountChoice::Exact(n) => write!(f, "{n}"),
            CountChoice::OrMore(n) => write!(f, "{n} or more"),
        }
    }
}

/// A value a [`CountChoice`] can hold.
pub trait CountValue: FromStr + PartialOrd + Copy {
    /// Whether a parsed value can appear as a count in the dataset.
    fn is_valid_count(&self) -> bool;
}

impl CountValue for u32 {
    fn is_valid_count(&self) -> bool {
        true
    }
}

impl CountValue for f64 {
    fn is_valid_count(&self) -> bool {
        self.is_finite() && *self >= 0.0
    }
}

/// Parses the labels produced by `Display`: `"Any"`, `"3"`, `"6 or more"`.
/// Non-finite or negative counts are rejected.
impl<T: CountValue> FromStr for CountChoice<T> {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || FilterError::InvalidChoice(s.to_string());
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            return Ok(CountChoice::Any);
        }
        let count = |text: &str| {
            text.trim()
                .parse::<T>()
                .ok()
                .filter(CountValue::is_valid_count)
                .ok_or_else(invalid)
        };
        if let Some(n) = s.strip_suffix("or more") {
            return count(n).map(CountChoice::OrMore);
        }
        if let Some(n) = s.strip_suffix('+') {
            return count(n).map(CountChoice::OrMore);
        }
        count(s).map(CountChoice::Exact)
    }
}

impl<T: fmt::Display> Serialize for CountChoice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive numeric range. Bounds given in reverse order are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    min: f64,
    max: f64,
}

impl ValueRange {
    pub fn new(a: f64, b: f64) -> Self {
        if a > b {
            ValueRange { min: b, max: a }
        } else {
            ValueRange { min: a, max: b }
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

// ---------------------------------------------------------------------------
// Criterion – one constraint on one attribute
// ---------------------------------------------------------------------------

/// A single constraint on one listing attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Locality(CategoryChoice),
    PropertyType(CategoryChoice),
    Price(ValueRange),
    Beds(CountChoice<u32>),
    Bath(CountChoice<f64>),
    Sqft(ValueRange),
}

impl Criterion {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Criterion::Locality(choice) => choice.matches(listing.locality()),
            Criterion::PropertyType(choice) => choice.matches(listing.property_type()),
            Criterion::Price(range) => range.contains(listing.price()),
            Criterion::Beds(choice) => choice.matches(listing.beds()),
            Criterion::Bath(choice) => choice.matches(listing.bath()),
            Criterion::Sqft(range) => range.contains(listing.sqft()),
        }
    }
}

/// Narrow a subset to the listings matching `criterion`.
pub fn apply<'a>(subset: Subset<'a>, criterion: &Criterion) -> Subset<'a> {
    subset.retain(|l| criterion.matches(l))
}

pub fn by_locality<'a>(subset: Subset<'a>, choice: &CategoryChoice) -> Subset<'a> {
    if choice.is_any() {
        return subset;
    }
    apply(subset, &Criterion::Locality(choice.clone()))
}

pub fn by_property_type<'a>(subset: Subset<'a>, choice: &CategoryChoice) -> Subset<'a> {
    if choice.is_any() {
        return subset;
    }
    apply(subset, &Criterion::PropertyType(choice.clone()))
}

pub fn by_price(subset: Subset<'_>, range: ValueRange) -> Subset<'_> {
    apply(subset, &Criterion::Price(range))
}

pub fn by_beds(subset: Subset<'_>, choice: CountChoice<u32>) -> Subset<'_> {
    if choice.is_any() {
        return subset;
    }
    apply(subset, &Criterion::Beds(choice))
}

pub fn by_bath(subset: Subset<'_>, choice: CountChoice<f64>) -> Subset<'_> {
    if choice.is_any() {
        return subset;
    }
    apply(subset, &Criterion::Bath(choice))
}

pub fn by_sqft(subset: Subset<'_>, range: ValueRange) -> Subset<'_> {
    apply(subset, &Criterion::Sqft(range))
}

// ---------------------------------------------------------------------------
// FilterCriteria – all constraints of one query
// ---------------------------------------------------------------------------

/// The full set of constraints for one query, combined with logical AND.
/// The default value constrains nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub locality: CategoryChoice,
    pub property_type: CategoryChoice,
    pub price: Option<ValueRange>,
    pub beds: CountChoice<u32>,
    pub bath: CountChoice<f64>,
    pub sqft: Option<ValueRange>,
}

impl FilterCriteria {
    #[must_use]
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = CategoryChoice::Exact(locality.into());
        self
    }

    #[must_use]
    pub fn with_localities<I, S>(mut self, localities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = localities.into_iter().map(Into::<String>::into).collect();
        self.locality = CategoryChoice::OneOf(set);
        self
    }

    #[must_use]
    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = CategoryChoice::Exact(property_type.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, min: f64, max: f64) -> Self {
        self.price = Some(ValueRange::new(min, max));
        self
    }

    #[must_use]
    pub fn with_beds(mut self, beds: CountChoice<u32>) -> Self {
        self.beds = beds;
        self
    }

    #[must_use]
    pub fn with_bath(mut self, bath: CountChoice<f64>) -> Self {
        self.bath = bath;
        self
    }

    #[must_use]
    pub fn with_sqft(mut self, min: f64, max: f64) -> Self {
        self.sqft = Some(ValueRange::new(min, max));
        self
    }

    /// The active constraints, one per constrained attribute.
    pub fn criteria(&self) -> Vec<Criterion> {
        let mut out = Vec::new();
        if !self.locality.is_any() {
            out.push(Criterion::Locality(self.locality.clone()));
        }
        if !self.property_type.is_any() {
            out.push(Criterion::PropertyType(self.property_type.clone()));
        }
        if let Some(range) = self.price {
            out.push(Criterion::Price(range));
        }
        if !self.beds.is_any() {
            out.push(Criterion::Beds(self.beds));
        }
        if !self.bath.is_any() {
            out.push(Criterion::Bath(self.bath));
        }
        if let Some(range) = self.sqft {
            out.push(Criterion::Sqft(range));
        }
        out
    }

    /// Filter the whole dataset.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Subset<'a> {
        self.apply_to(dataset.all())
    }

    /// Narrow an existing subset further.
    pub fn apply_to<'a>(&self, subset: Subset<'a>) -> Subset<'a> {
        let criteria = self.criteria();
        subset.retain(|l| criteria.iter().all(|c| c.matches(l)))
    }
}

// ---------------------------------------------------------------------------
// RawCriteria – untyped selector input
// ---------------------------------------------------------------------------

/// Criteria as they arrive from a form or command line: every field is text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCriteria {
    pub locality: Option<String>,
    pub property_type: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub beds: Option<String>,
    pub bath: Option<String>,
    pub sqft_min: Option<String>,
    pub sqft_max: Option<String>,
}

/// A field of [`RawCriteria`] that was replaced by "no constraint".
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {error}")]
pub struct Rejected {
    pub field: &'static str,
    pub error: FilterError,
}

fn parse_number(value: &str) -> Result<f64, FilterError> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FilterError::InvalidNumber(value.to_string()))
}

/// Parse an optional `[min, max]` pair. A missing side is unbounded.
fn parse_range(min: Option<&str>, max: Option<&str>) -> Result<Option<ValueRange>, FilterError> {
    let bound = |v: Option<&str>, open: f64| match v.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_number(s).map(Some),
    }
    .map(|v| v.unwrap_or(open));

    let has_min = min.is_some_and(|s| !s.trim().is_empty());
    let has_max = max.is_some_and(|s| !s.trim().is_empty());
    if !has_min && !has_max {
        return Ok(None);
    }
    let lo = bound(min, f64::NEG_INFINITY)?;
    let hi = bound(max, f64::INFINITY)?;
    Ok(Some(ValueRange::new(lo, hi)))
}

fn fill_bound(bound: &mut Option<String>, default: Option<f64>) {
    let blank = bound.as_deref().map_or(true, |s| s.trim().is_empty());
    if let Some(value) = default.filter(|_| blank) {
        *bound = Some(value.to_string());
    }
}

impl RawCriteria {
    /// Fill unset price bounds from `full`, the widest selectable range.
    pub fn or_price_range(mut self, full: Option<ValueRange>) -> Self {
        fill_bound(&mut self.price_min, full.map(|r| r.min()));
        fill_bound(&mut self.price_max, full.map(|r| r.max()));
        self
    }

    /// Fill unset square footage bounds from `full`.
    pub fn or_sqft_range(mut self, full: Option<ValueRange>) -> Self {
        fill_bound(&mut self.sqft_min, full.map(|r| r.min()));
        fill_bound(&mut self.sqft_max, full.map(|r| r.max()));
        self
    }

    /// Convert into typed criteria.
    ///
    /// A malformed field is logged, reported in the returned list and treated
    /// as "no constraint"; the rest of the query still applies.
    pub fn resolve(&self) -> (FilterCriteria, Vec<Rejected>) {
        let mut rejected = Vec::new();
        let mut reject = |field: &'static str, error: FilterError| {
            log::warn!("Ignoring {field} filter: {error}");
            rejected.push(Rejected { field, error });
        };

        let locality = self
            .locality
            .as_deref()
            .map_or(CategoryChoice::Any, CategoryChoice::from_label);
        let property_type = self
            .property_type
            .as_deref()
            .map_or(CategoryChoice::Any, CategoryChoice::from_label);

        let price = parse_range(self.price_min.as_deref(), self.price_max.as_deref())
            .unwrap_or_else(|e| {
                reject("price", e);
                None
            });
        let sqft = parse_range(self.sqft_min.as_deref(), self.sqft_max.as_deref())
            .unwrap_or_else(|e| {
                reject("sqft", e);
                None
            });

        let beds = match self.beds.as_deref().map(str::parse::<CountChoice<u32>>) {
            None => CountChoice::Any,
            Some(Ok(choice)) => choice,
            Some(Err(e)) => {
                reject("beds", e);
                CountChoice::Any
            }
        };
        let bath = match self.bath.as_deref().map(str::parse::<CountChoice<f64>>) {
            None => CountChoice::Any,
            Some(Ok(choice)) => choice,
            Some(Err(e)) => {
                reject("bath", e);
                CountChoice::Any
            }
        };

        let criteria = FilterCriteria {
            locality,
            property_type,
            price,
            beds,
            bath,
            sqft,
        };
        (criteria, rejected)
    }
}

// ---------------------------------------------------------------------------
// Selector option lists
// ---------------------------------------------------------------------------

/// Bed selector: Any, 1 .. threshold-1, "threshold or more".
pub fn bed_options(or_more: u32) -> Vec<CountChoice<u32>> {
    std::iter::once(CountChoice::Any)
        .chain((1..or_more).map(CountChoice::Exact))
        .chain(std::iter::once(CountChoice::OrMore(or_more)))
        .collect()
}

/// Bath selector built from the dataset's own values.
///
/// Exact options are the distinct observed bath counts below the whole part
/// of the maximum; the last option is "max or more". Exact values come
/// straight from the loaded data so equality comparisons stay meaningful.
pub fn bath_options(dataset: &Dataset) -> Vec<CountChoice<f64>> {
    let Some(max) = dataset
        .listings()
        .iter()
        .map(Listing::bath)
        .max_by(f64::total_cmp)
    else {
        return vec![CountChoice::Any];
    };
    let top = max.trunc();

    let mut observed: Vec<f64> = dataset
        .listings()
        .iter()
        .map(Listing::bath)
        .filter(|&b| b < top)
        .collect();
    observed.sort_by(f64::total_cmp);
    observed.dedup();

    std::iter::once(CountChoice::Any)
        .chain(observed.into_iter().map(CountChoice::Exact))
        .chain(std::iter::once(CountChoice::OrMore(top)))
        .collect()
}
