//! Boundary between listing providers and the calculator.
//!
//! Listing lookup and address autocomplete are external services; they are
//! modelled as traits here. The only thing that crosses into a comparison is
//! a validated home price, applied to a complete [`LoanInputs`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::loan_comparison::LoanInputs;
use crate::types::Money;
use crate::MortgageResult;

const DEFAULT_MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    /// Provider's automated valuation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zestimate: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_area: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
}

impl PropertyRecord {
    /// Asking price, falling back to the automated valuation.
    pub fn listing_price(&self) -> Option<Money> {
        let positive = |v: &Money| *v > Decimal::ZERO;
        self.price
            .filter(positive)
            .or_else(|| self.zestimate.filter(positive))
    }
}

/// Listing search criteria. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub state: Option<String>,
    pub price_min: Option<Money>,
    pub price_max: Option<Money>,
    pub min_bedrooms: Option<u32>,
    pub property_type: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, record: &PropertyRecord) -> bool {
        let address = record.address.to_lowercase();
        if let Some(city) = &self.city {
            if !address.contains(&city.to_lowercase()) {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if !address.contains(&state.to_lowercase()) {
                return false;
            }
        }
        let price = record.listing_price();
        if let (Some(min), Some(p)) = (self.price_min, price) {
            if p < min {
                return false;
            }
        }
        if let (Some(max), Some(p)) = (self.price_max, price) {
            if p > max {
                return false;
            }
        }
        if let Some(beds) = self.min_bedrooms {
            if record.bedrooms.unwrap_or(0) < beds {
                return false;
            }
        }
        if let Some(kind) = &self.property_type {
            if record.property_type.as_deref() != Some(kind.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Listing data provider.
pub trait PropertyLookup {
    fn search_by_address(&self, address: &str) -> MortgageResult<Vec<PropertyRecord>>;
    fn property_details(&self, id: &str) -> MortgageResult<Option<PropertyRecord>>;
}

/// Address autocomplete provider. Advisory only.
pub trait AddressSuggestions {
    fn suggest(&self, partial: &str) -> MortgageResult<Vec<String>>;
}

/// Replace the home price in `base` with the listing's price.
pub fn apply_listing_price(base: &LoanInputs, record: &PropertyRecord) -> MortgageResult<LoanInputs> {
    let home_price = record.listing_price().ok_or_else(|| {
        MortgageError::invalid(
            "home_price",
            format!("Listing '{}' has no usable price or valuation", record.id),
        )
    })?;

    let inputs = LoanInputs {
        home_price,
        ..base.clone()
    };
    inputs.validate()?;
    Ok(inputs)
}

/// Fixed set of listings searched by case-insensitive address substring.
#[derive(Debug, Clone)]
pub struct InMemoryPropertyLookup {
    records: Vec<PropertyRecord>,
    max_suggestions: usize,
}

impl InMemoryPropertyLookup {
    pub fn new(records: Vec<PropertyRecord>) -> Self {
        Self {
            records,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    /// Offline listings used when no provider is configured.
    pub fn sample() -> Self {
        let record = |id: &str,
                      address: &str,
                      price: Money,
                      zestimate: Money,
                      beds: u32,
                      baths: Decimal,
                      area: u32,
                      kind: &str,
                      built: u32| PropertyRecord {
            id: id.to_string(),
            address: address.to_string(),
            price: Some(price),
            zestimate: Some(zestimate),
            bedrooms: Some(beds),
            bathrooms: Some(baths),
            living_area: Some(area),
            property_type: Some(kind.to_string()),
            year_built: Some(built),
        };

        Self::new(vec![
            record(
                "1",
                "123 Main Street, New York, NY 10001",
                dec!(750_000),
                dec!(745_000),
                3,
                dec!(2),
                1200,
                "Single Family",
                2015,
            ),
            record(
                "2",
                "456 Oak Avenue, Los Angeles, CA 90210",
                dec!(1_200_000),
                dec!(1_185_000),
                4,
                dec!(3),
                2100,
                "Single Family",
                2018,
            ),
            record(
                "3",
                "789 Pine Street, Miami, FL 33101",
                dec!(895_000),
                dec!(890_000),
                3,
                dec!(2.5),
                1850,
                "Condo",
                2020,
            ),
        ])
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn search(&self, filter: &PropertyFilter) -> Vec<PropertyRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }
}

impl PropertyLookup for InMemoryPropertyLookup {
    fn search_by_address(&self, address: &str) -> MortgageResult<Vec<PropertyRecord>> {
        let needle = address.trim().to_lowercase();
        Ok(self
            .records
            .iter()
            .filter(|r| r.address.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn property_details(&self, id: &str) -> MortgageResult<Option<PropertyRecord>> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }
}

impl AddressSuggestions for InMemoryPropertyLookup {
    fn suggest(&self, partial: &str) -> MortgageResult<Vec<String>> {
        let needle = partial.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.address.to_lowercase().contains(&needle))
            .map(|r| r.address.clone())
            .take(self.max_suggestions)
            .collect())
    }
}
