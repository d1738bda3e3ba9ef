use serde::Serialize;

use super::aggregate::percentile;
use super::filter::FilterError;
use super::model::{Dataset, NumericColumn};

/// Percentile used for the top of a stepped range when none is configured.
pub const DEFAULT_RANGE_PERCENTILE: f64 = 0.95;

/// Upper limit on the length of a stepped range.
pub const MAX_RANGE_OPTIONS: usize = 5_000;

fn check_step(step: f64) -> Result<(), FilterError> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidStep(step))
    }
}

fn check_percentile(q: f64) -> Result<(), FilterError> {
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(FilterError::InvalidPercentile(q))
    }
}

/// Selectable values for a range control, e.g. price brackets.
///
/// Runs from the column minimum floored to a multiple of `step` up to the
/// 95th percentile floored to a multiple of `step` plus one extra step, so
/// outliers stay reachable as the top option without stretching the list.
/// Returns an empty list for an empty dataset.
pub fn build_range(
    dataset: &Dataset,
    column: NumericColumn,
    step: f64,
) -> Result<Vec<f64>, FilterError> {
    build_range_with(dataset, column, step, DEFAULT_RANGE_PERCENTILE)
}

/// Same as [`build_range`] with an explicit upper percentile.
pub fn build_range_with(
    dataset: &Dataset,
    column: NumericColumn,
    step: f64,
    upper_percentile: f64,
) -> Result<Vec<f64>, FilterError> {
    check_step(step)?;
    check_percentile(upper_percentile)?;
    stepped_options(&dataset.values(column), step, upper_percentile)
}

/// Stepped options over raw values. Every entry is `k * step` for a whole `k`.
pub fn stepped_options(
    values: &[f64],
    step: f64,
    upper_percentile: f64,
) -> Result<Vec<f64>, FilterError> {
    check_step(step)?;
    check_percentile(upper_percentile)?;

    let Some(min) = values.iter().copied().min_by(f64::total_cmp) else {
        return Ok(Vec::new());
    };
    let Some(top) = percentile(values, upper_percentile) else {
        return Ok(Vec::new());
    };

    let first = (min / step).floor();
    let last = (top / step).floor() + 1.0;
    let count = last - first + 1.0;
    if !(count <= MAX_RANGE_OPTIONS as f64) {
        return Err(FilterError::TooManyOptions(MAX_RANGE_OPTIONS));
    }
    Ok((0..count as usize).map(|k| (first + k as f64) * step).collect())
}

/// Bounds for a slider control over a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Slider from the whole part of the minimum to the whole part of the
/// `upper_percentile` value. `None` for an empty dataset.
pub fn slider_bounds(
    dataset: &Dataset,
    column: NumericColumn,
    upper_percentile: f64,
    step: f64,
) -> Result<Option<SliderBounds>, FilterError> {
    check_step(step)?;
    check_percentile(upper_percentile)?;

    let values = dataset.values(column);
    let Some(min) = values.iter().copied().min_by(f64::total_cmp) else {
        return Ok(None);
    };
    let max = percentile(&values, upper_percentile).unwrap_or(min);
    Ok(Some(SliderBounds {
        min: min.trunc(),
        max: max.trunc(),
        step,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_brackets() {
        let prices: Vec<f64> = (2..=20).map(|k| f64::from(k) * 50_000.0).collect();
        let options = stepped_options(&prices, 50_000.0, 0.95).unwrap();
        assert_eq!(options.first(), Some(&100_000.0));
        assert_eq!(options.last(), Some(&1_000_000.0));
        assert_eq!(options.len(), 19);
        assert!(options.windows(2).all(|w| w[1] - w[0] == 50_000.0));
    }

    #[test]
    fn floors_unaligned_minimum() {
        let options = stepped_options(&[120.0, 180.0, 260.0], 50.0, 1.0).unwrap();
        assert_eq!(options, vec![100.0, 150.0, 200.0, 250.0, 300.0]);
    }

    #[test]
    fn outlier_does_not_stretch_range() {
        let mut values = vec![100.0; 99];
        values.push(1_000_000.0);
        let options = stepped_options(&values, 100.0, 0.95).unwrap();
        assert_eq!(options, vec![100.0, 200.0]);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            stepped_options(&[1.0], 0.0, 0.95),
            Err(FilterError::InvalidStep(0.0))
        );
        assert_eq!(
            stepped_options(&[1.0], 10.0, 1.5),
            Err(FilterError::InvalidPercentile(1.5))
        );
    }

    #[test]
    fn oversized_range_is_rejected() {
        assert_eq!(
            stepped_options(&[1e30], 50_000.0, 0.95),
            Err(FilterError::TooManyOptions(MAX_RANGE_OPTIONS))
        );
        assert_eq!(
            stepped_options(&[0.0, 1e15], 50_000.0, 1.0),
            Err(FilterError::TooManyOptions(MAX_RANGE_OPTIONS))
        );
        assert_eq!(
            stepped_options(&[100_000.0, 900_000.0], 0.01, 1.0),
            Err(FilterError::TooManyOptions(MAX_RANGE_OPTIONS))
        );
        let widest = stepped_options(&[0.0, 4_998.0], 1.0, 1.0).unwrap();
        assert_eq!(widest.len(), MAX_RANGE_OPTIONS);
    }

    #[test]
    fn empty_values() {
        assert_eq!(stepped_options(&[], 10.0, 0.95), Ok(Vec::new()));
        let ds = Dataset::default();
        assert_eq!(slider_bounds(&ds, NumericColumn::Sqft, 0.99, 50.0), Ok(None));
    }
}
