//! Shared XLSX specification models.

use std::collections::BTreeMap;

use chrono::NaiveDate;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification with optional, overlayable properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,
    /// Vertical alignment (`top`, `vcenter`, `bottom`).
    pub valign: Option<String>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

/// Normalized cell value during conversion/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Calendar date value.
    Date(NaiveDate),
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HighlightRuleSpecification

/// Cells a highlight rule paints when its predicate holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumHighlightTarget {
    /// Only the tested column's cell.
    Cell,
    /// Every cell of the data row.
    Row,
}

/// Predicate evaluated against one cell of the tested column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumHighlightPredicate {
    /// Non-blank number exactly divisible by `divisor` (zero included).
    RoundNumber {
        /// Divisor, e.g. `10` for round birthdays.
        divisor: u32,
    },
    /// Text contains `token` (case-sensitive, no word boundary).
    Contains {
        /// Substring to look for.
        token: String,
    },
}

/// Declarative conditional-format rule: `{ target, predicate, format }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHighlightRule {
    /// Name of the column the predicate reads.
    pub col_name: String,
    /// Predicate over that column's cell value.
    pub predicate: EnumHighlightPredicate,
    /// Cell or whole-row painting.
    pub target: EnumHighlightTarget,
    /// Visual effect (fill/font colors).
    pub format: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Per-sheet call options.
#[derive(Debug, Clone)]
pub struct SpecXlsxSheetWriteOptions {
    /// Per-column format patches keyed by column name.
    pub cols_fmt_overrides: BTreeMap<String, SpecCellFormat>,
    /// Uniform width applied to every written column.
    pub width_col: f64,
    /// Conditional highlight rules attached to the data rows.
    pub highlight_rules: Vec<SpecHighlightRule>,
}

impl Default for SpecXlsxSheetWriteOptions {
    fn default() -> Self {
        Self {
            cols_fmt_overrides: BTreeMap::new(),
            width_col: crate::conf::N_WIDTH_COL_DEFAULT,
            highlight_rules: Vec::new(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Outcome of one written sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Number of data rows (header excluded).
    pub n_rows: usize,
    /// Number of written columns.
    pub n_cols: usize,
    /// Matched data-row count per highlight rule, in rule order.
    pub cnt_rows_highlighted: Vec<usize>,
    /// Non-fatal warnings (skipped rules, ignored overrides).
    pub warnings: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
