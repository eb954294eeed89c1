// Gratuity calculator - UAE end-of-service benefit formula
// Pure functions over primitive inputs; no I/O.

pub mod service_period;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use service_period::ServicePeriod;

/// Days in the month used to derive the daily wage from the basic salary.
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Service years accrued at the lower rate before the higher rate applies.
pub const FIRST_TIER_YEARS: f64 = 5.0;
pub const FIRST_TIER_DAYS_PER_YEAR: f64 = 21.0;
pub const SECOND_TIER_DAYS_PER_YEAR: f64 = 30.0;
/// Gratuity never exceeds two years of basic salary.
pub const CAP_MONTHS: f64 = 24.0;
pub const MINIMUM_YEARS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    #[default]
    Unlimited,
    Limited,
    /// Dubai International Financial Centre
    Difc,
    /// Abu Dhabi Global Market
    Adgm,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Unlimited => "unlimited",
            ContractType::Limited => "limited",
            ContractType::Difc => "difc",
            ContractType::Adgm => "adgm",
        }
    }

    /// Free-zone regimes accrue a flat 21 days per year with no second tier.
    pub fn is_flat_rate(&self) -> bool {
        matches!(self, ContractType::Difc | ContractType::Adgm)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GratuityError {
    InvalidSalary(f64),
    InvalidService(f64),
    InvalidPeriod(String),
}

impl fmt::Display for GratuityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GratuityError::InvalidSalary(v) => {
                write!(f, "basic salary must be a positive amount, got {}", v)
            }
            GratuityError::InvalidService(v) => {
                write!(f, "years of service must be greater than zero, got {}", v)
            }
            GratuityError::InvalidPeriod(msg) => write!(f, "invalid service period: {}", msg),
        }
    }
}

impl std::error::Error for GratuityError {}

impl From<GratuityError> for crate::error::AppError {
    fn from(err: GratuityError) -> Self {
        crate::error::AppError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GratuityInput {
    pub basic_salary: f64,
    pub years_of_service: f64,
    #[serde(default)]
    pub contract_type: ContractType,
}

/// Worked result, detailed enough for the widget to show each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GratuityBreakdown {
    pub contract_type: ContractType,
    pub basic_salary: f64,
    pub years_of_service: f64,
    pub eligible: bool,
    pub daily_wage: f64,
    pub first_tier_days: f64,
    pub first_tier_amount: f64,
    pub second_tier_days: f64,
    pub second_tier_amount: f64,
    pub uncapped_total: f64,
    pub cap: f64,
    pub capped: bool,
    pub total: f64,
}

fn validate(input: &GratuityInput) -> Result<(), GratuityError> {
    if !input.basic_salary.is_finite() || input.basic_salary <= 0.0 {
        return Err(GratuityError::InvalidSalary(input.basic_salary));
    }
    if !input.years_of_service.is_finite() || input.years_of_service <= 0.0 {
        return Err(GratuityError::InvalidService(input.years_of_service));
    }
    Ok(())
}

/// Compute the end-of-service gratuity for the given salary and service length.
pub fn calculate(input: &GratuityInput) -> Result<GratuityBreakdown, GratuityError> {
    validate(input)?;

    let daily_wage = input.basic_salary / DAYS_PER_MONTH;
    let cap = input.basic_salary * CAP_MONTHS;
    let years = input.years_of_service;

    if years < MINIMUM_YEARS {
        return Ok(GratuityBreakdown {
            contract_type: input.contract_type,
            basic_salary: input.basic_salary,
            years_of_service: years,
            eligible: false,
            daily_wage,
            first_tier_days: 0.0,
            first_tier_amount: 0.0,
            second_tier_days: 0.0,
            second_tier_amount: 0.0,
            uncapped_total: 0.0,
            cap,
            capped: false,
            total: 0.0,
        });
    }

    let (first_tier_days, second_tier_days) = if input.contract_type.is_flat_rate() {
        (years * FIRST_TIER_DAYS_PER_YEAR, 0.0)
    } else {
        let first_years = years.min(FIRST_TIER_YEARS);
        let later_years = (years - FIRST_TIER_YEARS).max(0.0);
        (
            first_years * FIRST_TIER_DAYS_PER_YEAR,
            later_years * SECOND_TIER_DAYS_PER_YEAR,
        )
    };

    let first_tier_amount = first_tier_days * daily_wage;
    let second_tier_amount = second_tier_days * daily_wage;
    let uncapped_total = first_tier_amount + second_tier_amount;
    let capped = uncapped_total > cap;

    Ok(GratuityBreakdown {
        contract_type: input.contract_type,
        basic_salary: input.basic_salary,
        years_of_service: years,
        eligible: true,
        daily_wage,
        first_tier_days,
        first_tier_amount: round_fils(first_tier_amount),
        second_tier_days,
        second_tier_amount: round_fils(second_tier_amount),
        uncapped_total: round_fils(uncapped_total),
        cap,
        capped,
        total: round_fils(uncapped_total.min(cap)),
    })
}

/// Round to the nearest fils (0.01 AED).
fn round_fils(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(salary: f64, years: f64, contract_type: ContractType) -> GratuityInput {
        GratuityInput {
            basic_salary: salary,
            years_of_service: years,
            contract_type,
        }
    }

    #[test]
    fn test_three_years_unlimited() {
        let result = calculate(&input(3000.0, 3.0, ContractType::Unlimited)).unwrap();
        assert!(result.eligible);
        assert_eq!(result.daily_wage, 100.0);
        assert_eq!(result.first_tier_days, 63.0);
        assert_eq!(result.second_tier_days, 0.0);
        assert_eq!(result.total, 6300.0);
        assert!(!result.capped);
    }

    #[test]
    fn test_seven_years_crosses_into_second_tier() {
        let result = calculate(&input(3000.0, 7.0, ContractType::Limited)).unwrap();
        assert_eq!(result.first_tier_amount, 10500.0);
        assert_eq!(result.second_tier_amount, 6000.0);
        assert_eq!(result.total, 16500.0);
    }

    #[test]
    fn test_under_one_year_is_not_eligible() {
        let result = calculate(&input(5000.0, 0.9, ContractType::Unlimited)).unwrap();
        assert!(!result.eligible);
        assert_eq!(result.total, 0.0);
    }

    #[test]
    fn test_exactly_one_year_is_eligible() {
        let result = calculate(&input(3000.0, 1.0, ContractType::Unlimited)).unwrap();
        assert!(result.eligible);
        assert_eq!(result.total, 2100.0);
    }

    #[test]
    fn test_cap_at_two_years_salary() {
        // 5*21 + 35*30 = 1155 days > 720 days cap
        let result = calculate(&input(3000.0, 40.0, ContractType::Unlimited)).unwrap();
        assert!(result.capped);
        assert_eq!(result.total, 72000.0);
        assert_eq!(result.uncapped_total, 115500.0);
    }

    #[test]
    fn test_free_zone_flat_rate() {
        let difc = calculate(&input(3000.0, 7.0, ContractType::Difc)).unwrap();
        assert_eq!(difc.first_tier_days, 147.0);
        assert_eq!(difc.second_tier_days, 0.0);
        assert_eq!(difc.total, 14700.0);

        let adgm = calculate(&input(3000.0, 7.0, ContractType::Adgm)).unwrap();
        assert_eq!(adgm.total, difc.total);
    }

    #[test]
    fn test_fractional_years() {
        let result = calculate(&input(3000.0, 5.5, ContractType::Unlimited)).unwrap();
        // 105 days + 15 days
        assert_eq!(result.total, 12000.0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert_eq!(
            calculate(&input(0.0, 3.0, ContractType::Unlimited)),
            Err(GratuityError::InvalidSalary(0.0))
        );
        assert_eq!(
            calculate(&input(3000.0, -1.0, ContractType::Unlimited)),
            Err(GratuityError::InvalidService(-1.0))
        );
        assert!(calculate(&input(3000.0, 0.0, ContractType::Unlimited)).is_err());
        assert!(calculate(&input(f64::NAN, 2.0, ContractType::Unlimited)).is_err());
        assert!(calculate(&input(3000.0, f64::INFINITY, ContractType::Unlimited)).is_err());
    }

    #[test]
    fn test_total_never_decreases_with_service() {
        let mut previous = 0.0;
        let mut years = 0.25;
        while years <= 45.0 {
            let total = calculate(&input(4200.0, years, ContractType::Unlimited))
                .unwrap()
                .total;
            assert!(total >= previous, "total dropped at {} years", years);
            assert!(total <= 4200.0 * CAP_MONTHS);
            previous = total;
            years += 0.25;
        }
    }

    #[test]
    fn test_contract_type_deserializes_lowercase() {
        let parsed: GratuityInput =
            serde_json::from_str(r#"{"basicSalary": 1000, "yearsOfService": 2, "contractType": "adgm"}"#)
                .unwrap();
        assert_eq!(parsed.contract_type, ContractType::Adgm);

        let defaulted: GratuityInput =
            serde_json::from_str(r#"{"basicSalary": 1000, "yearsOfService": 2}"#).unwrap();
        assert_eq!(defaulted.contract_type, ContractType::Unlimited);
    }
}
