//! Analysis clock: owns the reference date every date-relative stage uses.
//!
//! The date fill in imputation draws from the days preceding the reference
//! date. Runs pin it for reproducibility; the runner uses the system date.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisClock {
    pub reference_date: NaiveDate,
    pub pinned:         bool,
}

impl AnalysisClock {
    /// Clock reading today's local date.
    pub fn system() -> Self {
        Self {
            reference_date: Local::now().date_naive(),
            pinned:         false,
        }
    }

    /// Clock fixed to a given date.
    pub fn pinned(reference_date: NaiveDate) -> Self {
        Self { reference_date, pinned: true }
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
    }
}

/// `date` minus `days`, clamped to the calendar range. Negative offsets
/// count as zero.
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    let days = u64::try_from(days).unwrap_or(0);
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}
