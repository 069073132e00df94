//! Report options and outputs.

use bdaykit_io_xlsx::SpecSheetReport;

use crate::conf::N_TARGET_YEAR_DEFAULT;
use crate::stats::ReportBirthdayStats;

/// Options of one [`crate::report::build`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecBirthdayReportOptions {
    /// Year ages are computed for.
    pub target_year: i32,
    /// Emit the `Ohne_Geburtsdatum` sheet when undated rows exist.
    pub include_undated_sheet: bool,
}

impl Default for SpecBirthdayReportOptions {
    fn default() -> Self {
        Self {
            target_year: N_TARGET_YEAR_DEFAULT,
            include_undated_sheet: true,
        }
    }
}

/// Finished report: document bytes, statistics and per-sheet write reports.
#[derive(Debug, Clone)]
pub struct OutputBirthdayReport {
    /// Serialized `.xlsx` document.
    pub bytes: Vec<u8>,
    /// Counts over the whole normalized input.
    pub stats: ReportBirthdayStats,
    /// Written sheets in workbook order.
    pub sheets: Vec<SpecSheetReport>,
}

impl OutputBirthdayReport {
    /// Sheet titles in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.sheet_name.as_str()).collect()
    }
}
