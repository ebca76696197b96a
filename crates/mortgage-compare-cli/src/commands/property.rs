use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use mortgage_compare_core::lead::property::{
    self, AddressSuggestions, InMemoryPropertyLookup, PropertyFilter, PropertyLookup,
};
use mortgage_compare_core::loan_comparison::{self, ComparisonRequest};

use super::{EnvironmentArgs, LoanInputArgs};

/// Listing lookup against the bundled sample listings
#[derive(Args)]
pub struct PropertyArgs {
    #[command(subcommand)]
    pub command: PropertyCommand,
}

#[derive(Subcommand)]
pub enum PropertyCommand {
    /// Search listings by address or criteria
    Search(SearchArgs),
    /// Autocomplete a partial address
    Suggest(SuggestArgs),
    /// Compare the five programs using a listing's price
    Compare(ListingCompareArgs),
}

#[derive(Args)]
pub struct SearchArgs {
    /// Case-insensitive address substring
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub price_min: Option<Decimal>,

    #[arg(long)]
    pub price_max: Option<Decimal>,

    #[arg(long)]
    pub min_bedrooms: Option<u32>,

    /// e.g. "Single Family", "Condo"
    #[arg(long = "type")]
    pub property_type: Option<String>,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Partial address
    pub partial: String,

    /// Maximum suggestions returned
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

#[derive(Args)]
pub struct ListingCompareArgs {
    /// Listing id
    #[arg(long)]
    pub id: String,

    #[command(flatten)]
    pub loan: LoanInputArgs,

    #[command(flatten)]
    pub env: EnvironmentArgs,
}

pub fn run_property(args: PropertyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lookup = InMemoryPropertyLookup::sample();
    match args.command {
        PropertyCommand::Search(search) => run_search(&lookup, search),
        PropertyCommand::Suggest(suggest) => {
            let lookup = lookup.with_max_suggestions(suggest.limit);
            let suggestions = lookup.suggest(&suggest.partial)?;
            Ok(json!({ "suggestions": suggestions }))
        }
        PropertyCommand::Compare(cmp) => run_listing_compare(&lookup, cmp),
    }
}

fn run_search(
    lookup: &InMemoryPropertyLookup,
    args: SearchArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let filter = PropertyFilter {
        city: args.city,
        state: args.state,
        price_min: args.price_min,
        price_max: args.price_max,
        min_bedrooms: args.min_bedrooms,
        property_type: args.property_type,
    };

    let candidates = match &args.address {
        Some(address) => lookup.search_by_address(address)?,
        None => lookup.search(&PropertyFilter::default()),
    };
    let hits: Vec<_> = candidates.into_iter().filter(|r| filter.matches(r)).collect();
    log::debug!("{} listings matched", hits.len());
    Ok(serde_json::to_value(hits)?)
}

fn run_listing_compare(
    lookup: &InMemoryPropertyLookup,
    args: ListingCompareArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = lookup
        .property_details(&args.id)?
        .ok_or_else(|| format!("No listing with id '{}'", args.id))?;

    let base = args.loan.with_home_price(args.loan.home_price.unwrap_or_default());
    let inputs = property::apply_listing_price(&base, &record)?;

    let request = ComparisonRequest {
        inputs,
        environment: args.env.load()?,
        as_of: args.env.as_of,
    };
    let result = loan_comparison::run_comparison(&request)?;
    Ok(json!({
        "property": record,
        "result": result.result,
        "warnings": result.warnings,
        "methodology": result.methodology,
    }))
}
