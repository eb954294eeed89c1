use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::GratuityError;

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Employment span between the joining date and the last working day, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Unpaid absence does not count towards service.
    #[serde(default)]
    pub unpaid_leave_days: u32,
}

impl ServicePeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, unpaid_leave_days: u32) -> Self {
        Self {
            start_date,
            end_date,
            unpaid_leave_days,
        }
    }

    pub fn service_days(&self) -> Result<i64, GratuityError> {
        if self.end_date < self.start_date {
            return Err(GratuityError::InvalidPeriod(format!(
                "last working day {} is before joining date {}",
                self.end_date, self.start_date
            )));
        }
        let span = (self.end_date - self.start_date).num_days() + 1;
        let counted = span - i64::from(self.unpaid_leave_days);
        if counted <= 0 {
            return Err(GratuityError::InvalidPeriod(format!(
                "{} unpaid leave days exceed the {} day service span",
                self.unpaid_leave_days, span
            )));
        }
        Ok(counted)
    }

    pub fn years_of_service(&self) -> Result<f64, GratuityError> {
        Ok(self.service_days()? as f64 / DAYS_PER_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inclusive_span() {
        let period = ServicePeriod::new(date(2021, 1, 1), date(2021, 12, 31), 0);
        assert_eq!(period.service_days().unwrap(), 365);
        assert_eq!(period.years_of_service().unwrap(), 1.0);
    }

    #[test]
    fn test_unpaid_leave_is_deducted() {
        let period = ServicePeriod::new(date(2021, 1, 1), date(2021, 12, 31), 65);
        assert_eq!(period.service_days().unwrap(), 300);
        assert!(period.years_of_service().unwrap() < 1.0);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let period = ServicePeriod::new(date(2022, 1, 1), date(2021, 1, 1), 0);
        assert!(matches!(
            period.service_days(),
            Err(GratuityError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_leave_longer_than_service_is_rejected() {
        let period = ServicePeriod::new(date(2022, 1, 1), date(2022, 1, 10), 10);
        assert!(period.years_of_service().is_err());
    }
}
