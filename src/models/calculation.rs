use serde::{Deserialize, Serialize};

use super::{CmsDocument, Collection};
use crate::calculator::{ContractType, GratuityBreakdown};

/// Anonymous record of a calculator run, kept for usage reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub basic_salary: f64,
    pub years_of_service: f64,
    pub contract_type: ContractType,
    pub total: f64,
    pub eligible: bool,
    pub capped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Calculation {
    pub fn from_breakdown(breakdown: &GratuityBreakdown, source_path: Option<String>) -> Self {
        Self {
            basic_salary: breakdown.basic_salary,
            years_of_service: breakdown.years_of_service,
            contract_type: breakdown.contract_type,
            total: breakdown.total,
            eligible: breakdown.eligible,
            capped: breakdown.capped,
            source_path,
        }
    }
}

impl CmsDocument for Calculation {
    const COLLECTION: Collection = Collection::Calculations;
}
