//! Static reference data consumed by the comparison: program base rates,
//! program-specific terms, credit-bucket adjustments, PMI rates and the ARM
//! index. Everything is injected through [`RateEnvironment`] so callers can
//! price against alternate rate environments.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MortgageError;
use crate::types::{Money, Percent};
use crate::MortgageResult;

use super::closing_costs::ClosingCostSchedule;
use super::mortgage_insurance::PmiCancellationMethod;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// The five compared loan programs. Serialises as the lowercase key used in
/// comparison output (`conventional`, `fha`, `va`, `usda`, `arm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Conventional,
    Fha,
    Va,
    Usda,
    Arm,
}

impl LoanType {
    pub const ALL: [LoanType; 5] = [
        LoanType::Conventional,
        LoanType::Fha,
        LoanType::Va,
        LoanType::Usda,
        LoanType::Arm,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LoanType::Conventional => "conventional",
            LoanType::Fha => "fha",
            LoanType::Va => "va",
            LoanType::Usda => "usda",
            LoanType::Arm => "arm",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Credit score ranges offered by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditScoreBucket {
    #[serde(rename = "760+")]
    Score760Plus,
    #[serde(rename = "720-759")]
    Score720To759,
    #[serde(rename = "680-719")]
    Score680To719,
    #[serde(rename = "660-679")]
    Score660To679,
    #[serde(rename = "620-659")]
    Score620To659,
    #[serde(rename = "<620")]
    Below620,
}

impl CreditScoreBucket {
    pub const ALL: [CreditScoreBucket; 6] = [
        CreditScoreBucket::Score760Plus,
        CreditScoreBucket::Score720To759,
        CreditScoreBucket::Score680To719,
        CreditScoreBucket::Score660To679,
        CreditScoreBucket::Score620To659,
        CreditScoreBucket::Below620,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CreditScoreBucket::Score760Plus => "760+",
            CreditScoreBucket::Score720To759 => "720-759",
            CreditScoreBucket::Score680To719 => "680-719",
            CreditScoreBucket::Score660To679 => "660-679",
            CreditScoreBucket::Score620To659 => "620-659",
            CreditScoreBucket::Below620 => "<620",
        }
    }
}

impl fmt::Display for CreditScoreBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CreditScoreBucket {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        CreditScoreBucket::ALL
            .into_iter()
            .find(|b| b.label() == trimmed)
            .ok_or_else(|| {
                MortgageError::invalid(
                    "credit_score",
                    format!("Unrecognised credit score bucket '{trimmed}'"),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Program definitions
// ---------------------------------------------------------------------------

/// Fields every program carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramInfo {
    /// Base annual rate before credit and point adjustments.
    pub base_rate: Percent,
    pub name: String,
    pub description: String,
}

impl ProgramInfo {
    fn new(base_rate: Percent, name: &str, description: &str) -> Self {
        Self {
            base_rate,
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionalProgram {
    pub info: ProgramInfo,
    /// PMI is charged only above this loan-to-value.
    pub pmi_ltv_threshold: Percent,
    /// PMI drops off automatically once the balance reaches this share of
    /// the original home value.
    pub pmi_cancel_ltv: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FhaProgram {
    pub info: ProgramInfo,
    /// Upfront MIP as a percent of the loan amount.
    pub upfront_mip_rate: Percent,
    /// Annual MIP when the down payment is below `reduced_mip_min_down_percent`.
    pub annual_mip_rate: Percent,
    /// Annual MIP at or above `reduced_mip_min_down_percent` down.
    pub reduced_annual_mip_rate: Percent,
    pub reduced_mip_min_down_percent: Percent,
    /// MIP duration when the reduced schedule applies; below it MIP runs
    /// for the life of the loan.
    pub limited_mip_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaProgram {
    pub info: ProgramInfo,
    /// Funding fee as a percent of the loan amount.
    pub funding_fee_rate: Percent,
    /// The funding fee is charged only when the price exceeds this limit.
    pub funding_fee_price_threshold: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsdaProgram {
    pub info: ProgramInfo,
}

/// Rate adjustment caps, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmCaps {
    pub initial: Percent,
    pub periodic: Percent,
    pub lifetime: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmProgram {
    pub info: ProgramInfo,
    /// Spread over the index once the rate starts adjusting.
    pub margin: Percent,
    pub caps: ArmCaps,
    /// Length of the initial fixed-rate period.
    pub fixed_period_months: u32,
}

/// One row of the rate table per program. Any program or field left out of
/// a config file keeps its default; an `info` block that is given must be
/// complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTable {
    pub conventional: ConventionalProgram,
    pub fha: FhaProgram,
    pub va: VaProgram,
    pub usda: UsdaProgram,
    pub arm: ArmProgram,
}

/// A borrowed view of one program, tagged with its program-specific terms.
#[derive(Debug, Clone, Copy)]
pub enum LoanProgram<'a> {
    Conventional(&'a ConventionalProgram),
    Fha(&'a FhaProgram),
    Va(&'a VaProgram),
    Usda(&'a UsdaProgram),
    Arm(&'a ArmProgram),
}

impl<'a> LoanProgram<'a> {
    pub fn loan_type(&self) -> LoanType {
        match self {
            LoanProgram::Conventional(_) => LoanType::Conventional,
            LoanProgram::Fha(_) => LoanType::Fha,
            LoanProgram::Va(_) => LoanType::Va,
            LoanProgram::Usda(_) => LoanType::Usda,
            LoanProgram::Arm(_) => LoanType::Arm,
        }
    }

    pub fn info(&self) -> &'a ProgramInfo {
        match self {
            LoanProgram::Conventional(p) => &p.info,
            LoanProgram::Fha(p) => &p.info,
            LoanProgram::Va(p) => &p.info,
            LoanProgram::Usda(p) => &p.info,
            LoanProgram::Arm(p) => &p.info,
        }
    }
}

impl RateTable {
    /// All programs in output order.
    pub fn programs(&self) -> [LoanProgram<'_>; 5] {
        LoanType::ALL.map(|t| self.program(t))
    }

    pub fn program(&self, loan_type: LoanType) -> LoanProgram<'_> {
        match loan_type {
            LoanType::Conventional => LoanProgram::Conventional(&self.conventional),
            LoanType::Fha => LoanProgram::Fha(&self.fha),
            LoanType::Va => LoanProgram::Va(&self.va),
            LoanType::Usda => LoanProgram::Usda(&self.usda),
            LoanType::Arm => LoanProgram::Arm(&self.arm),
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            conventional: ConventionalProgram::default(),
            fha: FhaProgram::default(),
            va: VaProgram::default(),
            usda: UsdaProgram::default(),
            arm: ArmProgram::default(),
        }
    }
}

impl Default for ConventionalProgram {
    fn default() -> Self {
        Self {
            info: ProgramInfo::new(
                dec!(6.5),
                "Conventional",
                "Standard loan with competitive rates",
            ),
            pmi_ltv_threshold: dec!(80),
            pmi_cancel_ltv: dec!(78),
        }
    }
}

impl Default for FhaProgram {
    fn default() -> Self {
        Self {
            info: ProgramInfo::new(
                dec!(6.25),
                "FHA",
                "Government-backed loan with lower down payment",
            ),
            upfront_mip_rate: dec!(1.75),
            annual_mip_rate: dec!(0.85),
            reduced_annual_mip_rate: dec!(0.80),
            reduced_mip_min_down_percent: dec!(10),
            limited_mip_years: 11,
        }
    }
}

impl Default for VaProgram {
    fn default() -> Self {
        Self {
            info: ProgramInfo::new(
                dec!(6.125),
                "VA",
                "Veterans Affairs loan with no down payment",
            ),
            funding_fee_rate: dec!(2.3),
            funding_fee_price_threshold: dec!(766_550),
        }
    }
}

impl Default for UsdaProgram {
    fn default() -> Self {
        Self {
            info: ProgramInfo::new(dec!(6.2), "USDA", "Rural development loan program"),
        }
    }
}

impl Default for ArmCaps {
    fn default() -> Self {
        Self {
            initial: dec!(2),
            periodic: dec!(2),
            lifetime: dec!(5),
        }
    }
}

impl Default for ArmProgram {
    fn default() -> Self {
        Self {
            info: ProgramInfo::new(dec!(5.75), "ARM 5/1", "Adjustable rate mortgage"),
            margin: dec!(2.25),
            caps: ArmCaps::default(),
            fixed_period_months: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Rate environment
// ---------------------------------------------------------------------------

/// Complete pricing configuration for one comparison run. Missing fields in
/// a config file fall back to the defaults, down to individual program terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateEnvironment {
    pub rates: RateTable,
    /// Added to every program's base rate.
    pub credit_adjustments: BTreeMap<CreditScoreBucket, Percent>,
    /// Annual PMI rate charged on conventional loans above the LTV threshold.
    pub pmi_rates: BTreeMap<CreditScoreBucket, Percent>,
    /// Current ARM index (SOFR).
    pub index_rate: Percent,
    /// Rate reduction bought by one discount point.
    pub point_rate_reduction: Percent,
    pub closing_costs: ClosingCostSchedule,
    pub pmi_cancellation: PmiCancellationMethod,
}

impl Default for RateEnvironment {
    fn default() -> Self {
        let credit_adjustments = CreditScoreBucket::ALL
            .into_iter()
            .zip([
                dec!(0),
                dec!(0.125),
                dec!(0.25),
                dec!(0.375),
                dec!(0.75),
                dec!(1.5),
            ])
            .collect();
        let pmi_rates = CreditScoreBucket::ALL
            .into_iter()
            .zip([
                dec!(0.35),
                dec!(0.45),
                dec!(0.55),
                dec!(0.65),
                dec!(0.85),
                dec!(1.25),
            ])
            .collect();

        Self {
            rates: RateTable::default(),
            credit_adjustments,
            pmi_rates,
            index_rate: dec!(4.5),
            point_rate_reduction: dec!(0.25),
            closing_costs: ClosingCostSchedule::default(),
            pmi_cancellation: PmiCancellationMethod::default(),
        }
    }
}

impl RateEnvironment {
    pub fn credit_adjustment(&self, bucket: CreditScoreBucket) -> MortgageResult<Percent> {
        self.credit_adjustments.get(&bucket).copied().ok_or_else(|| {
            MortgageError::invalid(
                "credit_adjustments",
                format!("No rate adjustment configured for credit bucket {bucket}"),
            )
        })
    }

    pub fn pmi_rate(&self, bucket: CreditScoreBucket) -> MortgageResult<Percent> {
        self.pmi_rates.get(&bucket).copied().ok_or_else(|| {
            MortgageError::invalid(
                "pmi_rates",
                format!("No PMI rate configured for credit bucket {bucket}"),
            )
        })
    }

    /// Sanity checks on an injected environment.
    pub fn validate(&self) -> MortgageResult<()> {
        for program in self.rates.programs() {
            if program.info().base_rate < Decimal::ZERO {
                return Err(MortgageError::invalid(
                    format!("rates.{}.info.base_rate", program.loan_type()),
                    "Base rate cannot be negative",
                ));
            }
        }
        if self.pmi_rates.values().any(|r| *r < Decimal::ZERO) {
            return Err(MortgageError::invalid(
                "pmi_rates",
                "PMI rates cannot be negative",
            ));
        }
        if self.point_rate_reduction < Decimal::ZERO {
            return Err(MortgageError::invalid(
                "point_rate_reduction",
                "Point rate reduction cannot be negative",
            ));
        }
        let caps = &self.rates.arm.caps;
        if caps.periodic < Decimal::ZERO || caps.lifetime < Decimal::ZERO {
            return Err(MortgageError::invalid(
                "rates.arm.caps",
                "ARM caps cannot be negative",
            ));
        }
        if self.rates.arm.fixed_period_months == 0 {
            return Err(MortgageError::invalid(
                "rates.arm.fixed_period_months",
                "Fixed period must be at least one month",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bucket_parse_round_trip_labels() {
        for bucket in CreditScoreBucket::ALL {
            assert_eq!(bucket.label().parse::<CreditScoreBucket>().unwrap(), bucket);
        }
    }

    #[test]
    fn test_bucket_parse_rejects_unknown() {
        let err = "800+".parse::<CreditScoreBucket>().unwrap_err();
        match err {
            MortgageError::InvalidInput { field, .. } => assert_eq!(field, "credit_score"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bucket_serde_uses_labels() {
        let json = serde_json::to_string(&CreditScoreBucket::Below620).unwrap();
        assert_eq!(json, "\"<620\"");
        let parsed: CreditScoreBucket = serde_json::from_str("\"720-759\"").unwrap();
        assert_eq!(parsed, CreditScoreBucket::Score720To759);
    }

    #[test]
    fn test_default_tables_cover_every_bucket() {
        let env = RateEnvironment::default();
        for bucket in CreditScoreBucket::ALL {
            assert!(env.credit_adjustment(bucket).is_ok());
            assert!(env.pmi_rate(bucket).is_ok());
        }
        assert_eq!(
            env.credit_adjustment(CreditScoreBucket::Score720To759).unwrap(),
            dec!(0.125)
        );
        assert_eq!(env.pmi_rate(CreditScoreBucket::Below620).unwrap(), dec!(1.25));
    }

    #[test]
    fn test_missing_bucket_is_invalid_input() {
        let mut env = RateEnvironment::default();
        env.pmi_rates.remove(&CreditScoreBucket::Score660To679);
        assert!(matches!(
            env.pmi_rate(CreditScoreBucket::Score660To679),
            Err(MortgageError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_programs_in_output_order() {
        let table = RateTable::default();
        let order: Vec<LoanType> = table.programs().iter().map(|p| p.loan_type()).collect();
        assert_eq!(order, LoanType::ALL.to_vec());
        assert_eq!(table.program(LoanType::Arm).info().name, "ARM 5/1");
    }

    #[test]
    fn test_partial_environment_file_uses_defaults() {
        let env: RateEnvironment = serde_json::from_str(r#"{"index_rate": "5.25"}"#).unwrap();
        assert_eq!(env.index_rate, dec!(5.25));
        assert_eq!(env.rates, RateTable::default());
        assert_eq!(env.point_rate_reduction, dec!(0.25));
    }

    #[test]
    fn test_partial_program_block_keeps_other_terms() {
        let env: RateEnvironment =
            serde_json::from_str(r#"{"rates": {"arm": {"margin": "2.75"}}}"#).unwrap();
        assert_eq!(env.rates.arm.margin, dec!(2.75));
        assert_eq!(env.rates.arm.caps, ArmCaps::default());
        assert_eq!(env.rates.arm.info.name, "ARM 5/1");
        assert_eq!(env.rates.fha, FhaProgram::default());

        let env: RateEnvironment =
            serde_json::from_str(r#"{"rates": {"arm": {"caps": {"lifetime": "6"}}}}"#).unwrap();
        assert_eq!(env.rates.arm.caps.lifetime, dec!(6));
        assert_eq!(env.rates.arm.caps.periodic, dec!(2));
    }

    #[test]
    fn test_validate_rejects_negative_base_rate() {
        let mut env = RateEnvironment::default();
        env.rates.usda.info.base_rate = dec!(-1);
        assert!(env.validate().is_err());
        assert!(RateEnvironment::default().validate().is_ok());
    }
}
