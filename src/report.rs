use std::fmt::Write;

use housing_explorer::data::aggregate::{Aggregated, SummaryStats};
use housing_explorer::session::{CityComparison, CityListings, MapView, SelectionOptions, TypeSpace};
use housing_explorer::Listing;

// ---------------------------------------------------------------------------
// Plain-text rendering for the command line
// ---------------------------------------------------------------------------

/// Whole dollars with thousands separators: `$1,250,000`.
pub fn money(value: f64) -> String {
    let whole = value.round().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if value.round() < 0.0 {
        out.push('-');
    }
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn listings_table(out: &mut String, rows: &[&Listing]) {
    let _ = writeln!(
        out,
        "{:<48} {:>14} {:>5} {:>6} {:>9}  TYPE",
        "ADDRESS", "PRICE", "BEDS", "BATH", "SQFT"
    );
    for l in rows {
        let _ = writeln!(
            out,
            "{:<48} {:>14} {:>5} {:>6} {:>9}  {}",
            l.address(),
            money(l.price()),
            l.beds(),
            l.bath(),
            l.sqft(),
            l.property_type()
        );
    }
}

fn summary(out: &mut String, stats: &SummaryStats) {
    let _ = writeln!(out, "Number of listings:     {}", stats.count);
    let _ = writeln!(out, "Median price:           {}", money(stats.median_price));
    let _ = writeln!(
        out,
        "Median price per sqft:  {}",
        money(stats.median_price_per_sqft)
    );
}

pub fn city_listings(result: &CityListings<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Listings in {}", result.locality);
    if let Some(note) = result.note {
        let _ = writeln!(out, "Note about {}: {note}", result.locality);
    }
    match &result.summary {
        Aggregated::NoData => out.push_str("No results. Adjust your filters.\n"),
        Aggregated::Ready(stats) => {
            summary(&mut out, stats);
            out.push('\n');
            listings_table(&mut out, &result.listings);
        }
    }
    out
}

pub fn comparison(result: &Aggregated<CityComparison>) -> String {
    let Aggregated::Ready(cmp) = result else {
        return "No results found.\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:>14} {:>14} {:>9}",
        "City", "Average Price", "Median Price", "Listings"
    );
    for g in &cmp.price_by_locality {
        let _ = writeln!(
            out,
            "{:<24} {:>14} {:>14} {:>9}",
            g.key,
            money(g.mean),
            money(g.median),
            g.count
        );
    }

    let tab = &cmp.type_counts;
    out.push_str("\nCount of listings by area and property type\n");
    let _ = write!(out, "{:<24}", "");
    for col in &tab.col_labels {
        let _ = write!(out, " {col:>16}");
    }
    out.push('\n');
    for (label, row) in tab.row_labels.iter().zip(&tab.counts) {
        let _ = write!(out, "{label:<24}");
        for count in row {
            let _ = write!(out, " {count:>16}");
        }
        out.push('\n');
    }
    out
}

pub fn space(result: &Aggregated<Vec<TypeSpace>>) -> String {
    let Aggregated::Ready(rows) = result else {
        return "No homes match these filters.\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "{:<32} {:>24}", "Property Type", "Average Square Footage");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<32} {:>24}",
            row.property_type,
            format!("{:.0} sqft", row.mean_sqft)
        );
    }
    out
}

pub fn map(result: &Aggregated<MapView<'_>>) -> String {
    let Aggregated::Ready(view) = result else {
        return "No homes to show on the map with the current filters.\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Centre: {:.5}, {:.5} ({} listings)",
        view.center_latitude,
        view.center_longitude,
        view.points.len()
    );
    for l in &view.points {
        let _ = writeln!(
            out,
            "{:>10.5} {:>11.5}  {}  {}",
            l.latitude(),
            l.longitude(),
            money(l.price()),
            l.address()
        );
    }
    out
}

pub fn options(opts: &SelectionOptions) -> String {
    let join = |items: Vec<String>| items.join(", ");
    let mut out = String::new();
    let _ = writeln!(out, "Localities:     {}", opts.localities.join(", "));
    let _ = writeln!(out, "Property types: {}", opts.property_types.join(", "));
    let _ = writeln!(
        out,
        "Bedrooms:       {}",
        join(opts.beds.iter().map(ToString::to_string).collect())
    );
    let _ = writeln!(
        out,
        "Bathrooms:      {}",
        join(opts.baths.iter().map(ToString::to_string).collect())
    );
    let _ = writeln!(
        out,
        "Prices:         {}",
        join(opts.prices.iter().map(|&p| money(p)).collect())
    );
    if let Some(sqft) = opts.sqft {
        let _ = writeln!(
            out,
            "Square footage: {} to {} (step {})",
            sqft.min, sqft.max, sqft.step
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "$0");
        assert_eq!(money(950.0), "$950");
        assert_eq!(money(1_000.0), "$1,000");
        assert_eq!(money(1_250_000.4), "$1,250,000");
        assert_eq!(money(-52_500.0), "-$52,500");
    }

    #[test]
    fn empty_results_have_messages() {
        assert_eq!(comparison(&Aggregated::NoData), "No results found.\n");
        assert_eq!(space(&Aggregated::NoData), "No homes match these filters.\n");
    }
}
