mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use housing_explorer::data::filter::Rejected;
use housing_explorer::session::{CityQuery, ComparisonQuery, SpaceQuery};
use housing_explorer::{load_file, ExplorerConfig, FilterCriteria, RawCriteria, Session};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CommandArgs {
    /// Listings file (.csv, .json, .parquet)
    #[arg(long, short)]
    data: PathBuf,
    /// JSON file overriding option steps and percentiles
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print results as JSON instead of text tables
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Find homes in one city
    Find(FindArg),
    /// Compare prices across two cities
    Compare(CompareArg),
    /// Average square footage per property type
    Space(SpaceArg),
    /// Listings with coordinates, centred on their mean position
    Map(MapArg),
    /// Print the values offered by each selection control
    Options,
}

#[derive(Debug, Clone, Default, Args)]
struct PriceArg {
    /// Lowest price, e.g. 300000 or "$300,000" [default: lowest price option]
    #[arg(long)]
    min_price: Option<String>,
    /// Highest price [default: highest price option]
    #[arg(long)]
    max_price: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct FindArg {
    #[arg(long)]
    city: String,
    #[command(flatten)]
    price: PriceArg,
    /// "Any", an exact count, or "6 or more"
    #[arg(long)]
    beds: Option<String>,
    /// "Any", an exact count, or "N or more"
    #[arg(long)]
    bath: Option<String>,
    #[arg(long = "type")]
    property_type: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct CompareArg {
    #[arg(long)]
    first: String,
    #[arg(long)]
    second: String,
    #[command(flatten)]
    price: PriceArg,
    #[arg(long)]
    beds: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct SpaceArg {
    #[arg(long)]
    min_sqft: Option<String>,
    #[arg(long)]
    max_sqft: Option<String>,
    #[command(flatten)]
    price: PriceArg,
}

#[derive(Debug, Clone, Args)]
struct MapArg {
    /// Locality, or "All areas"
    #[arg(long)]
    city: Option<String>,
    #[command(flatten)]
    price: PriceArg,
    #[arg(long)]
    beds: Option<String>,
    #[arg(long)]
    bath: Option<String>,
    #[arg(long = "type")]
    property_type: Option<String>,
}

/// Resolve text criteria, reporting every field that fell back to "any".
fn resolve(raw: &RawCriteria) -> FilterCriteria {
    let (criteria, rejected) = raw.resolve();
    for Rejected { field, error } in &rejected {
        eprintln!("warning: ignoring {field} filter: {error}");
    }
    criteria
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = CommandArgs::parse();

    let config = ExplorerConfig::load_or_default(args.config.as_deref()).context("loading config")?;
    let dataset =
        load_file(&args.data).with_context(|| format!("loading {}", args.data.display()))?;
    let session =
        Session::new(Arc::new(dataset), &config).context("building selection options")?;
    let full_price = session.options().full_price_range();

    match args.mode {
        Mode::Find(arg) => {
            let criteria = resolve(&RawCriteria {
                price_min: arg.price.min_price,
                price_max: arg.price.max_price,
                beds: arg.beds,
                bath: arg.bath,
                property_type: arg.property_type,
                ..RawCriteria::default()
            }
            .or_price_range(full_price));
            let result = session.find_homes(&CityQuery {
                locality: arg.city,
                price: criteria.price,
                beds: criteria.beds,
                bath: criteria.bath,
                property_type: criteria.property_type,
            });
            emit(args.json, &result, report::city_listings)
        }
        Mode::Compare(arg) => {
            let criteria = resolve(&RawCriteria {
                price_min: arg.price.min_price,
                price_max: arg.price.max_price,
                beds: arg.beds,
                ..RawCriteria::default()
            }
            .or_price_range(full_price));
            let result = session.compare_cities(&ComparisonQuery {
                first: arg.first,
                second: arg.second,
                price: criteria.price,
                beds: criteria.beds,
            });
            emit(args.json, &result, report::comparison)
        }
        Mode::Space(arg) => {
            let criteria = resolve(&RawCriteria {
                price_min: arg.price.min_price,
                price_max: arg.price.max_price,
                sqft_min: arg.min_sqft,
                sqft_max: arg.max_sqft,
                ..RawCriteria::default()
            }
            .or_price_range(full_price)
            .or_sqft_range(session.options().full_sqft_range()));
            let result = session.space_by_type(&SpaceQuery {
                sqft: criteria.sqft,
                price: criteria.price,
            });
            emit(args.json, &result, report::space)
        }
        Mode::Map(arg) => {
            let criteria = resolve(&RawCriteria {
                locality: arg.city,
                price_min: arg.price.min_price,
                price_max: arg.price.max_price,
                beds: arg.beds,
                bath: arg.bath,
                property_type: arg.property_type,
                ..RawCriteria::default()
            }
            .or_price_range(full_price));
            let result = session.map_view(&criteria);
            emit(args.json, &result, report::map)
        }
        Mode::Options => emit(args.json, session.options(), report::options),
    }
}
