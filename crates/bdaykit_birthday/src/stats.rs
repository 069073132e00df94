//! Aggregate counts over the normalized table.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use polars::prelude::DataFrame;

use crate::conf::{C_COL_BIRTH_DATE, C_COL_FIRST_NAME};

/// Counts reported next to the workbook; each is `None` when its source
/// column is absent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportBirthdayStats {
    /// Rows with a non-null first name.
    pub cnt_names: Option<u64>,
    /// Rows with a parsed birth date.
    pub cnt_birth_dates: Option<u64>,
    /// Rows without a birth date.
    pub cnt_birth_dates_missing: Option<u64>,
}

impl ReportBirthdayStats {
    /// Count over `df` with its birth dates already parsed into `dates`.
    ///
    /// Birth-date counts follow the parsed values, so a cell that does not
    /// parse counts as missing even when it holds text.
    pub fn from_dataframe(df: &DataFrame, dates: &[Option<NaiveDate>]) -> Self {
        let n_height = df.height() as u64;
        let cnt_names = df
            .column(C_COL_FIRST_NAME)
            .ok()
            .map(|col| n_height - col.null_count() as u64);

        let cnt_birth_dates = df
            .column(C_COL_BIRTH_DATE)
            .ok()
            .map(|_| dates.iter().filter(|date| date.is_some()).count() as u64);
        Self {
            cnt_names,
            cnt_birth_dates,
            cnt_birth_dates_missing: cnt_birth_dates.map(|n| dates.len() as u64 - n),
        }
    }

    /// Machine-readable counters; absent counts are left out.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        for (c_key, cnt) in [
            ("cnt_names", self.cnt_names),
            ("cnt_birth_dates", self.cnt_birth_dates),
            ("cnt_birth_dates_missing", self.cnt_birth_dates_missing),
        ] {
            if let Some(cnt) = cnt {
                dict_counts.insert(c_key.to_string(), cnt);
            }
        }
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let mut l_parts = vec![prefix.to_string()];
        for (c_label, cnt) in [
            ("names", self.cnt_names),
            ("birth_dates", self.cnt_birth_dates),
            ("birth_dates_missing", self.cnt_birth_dates_missing),
        ] {
            if let Some(cnt) = cnt {
                l_parts.push(format!("{c_label}={cnt}"));
            }
        }
        l_parts.join(" ")
    }
}

impl fmt::Display for ReportBirthdayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[STATS]"))
    }
}
