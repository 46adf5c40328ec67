//! Shared report specification models and error types.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::conf::{
    C_COL_EMPLOYEE_ID, C_COL_EMPLOYEE_NAME, C_COL_FARE, C_CUSTOMER_NAME_DEFAULT,
    C_SHEET_NAME_SEPARATOR, N_FONT_SIZE_BASE, N_WIDTH_COL_LOCATION, TUP_COLS_LOCATION,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Raw cell value as supplied by the grid loader.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Build a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Text payload, if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether the cell carries no value.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Header-less rows x columns cell matrix.
pub type RawGrid = Vec<Vec<EnumCellValue>>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TripTable

/// Segmented trip table: header row promoted to column names.
///
/// Every record has exactly `columns.len()` cells. Column names are kept
/// verbatim, duplicates included; lookups resolve to the first match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTripTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Record cells aligned with `columns`.
    pub records: Vec<Vec<EnumCellValue>>,
}

impl SpecTripTable {
    /// Build a table, padding or truncating records to the header width.
    pub fn new(columns: Vec<String>, records: Vec<Vec<EnumCellValue>>) -> Self {
        let n_width = columns.len();
        let records = records
            .into_iter()
            .map(|mut record| {
                record.resize(n_width, EnumCellValue::None);
                record
            })
            .collect();
        Self { columns, records }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of records.
    pub fn height(&self) -> usize {
        self.records.len()
    }

    /// First column index named `column`.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == column)
    }

    /// Header row followed by records, as a raw grid.
    pub fn to_raw_grid(&self) -> RawGrid {
        let mut grid = Vec::with_capacity(self.records.len() + 1);
        grid.push(
            self.columns
                .iter()
                .map(|c_name| EnumCellValue::String(c_name.clone()))
                .collect(),
        );
        grid.extend(self.records.iter().cloned());
        grid
    }
}

/// Table segmentation result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSegmentedTable {
    /// Trip table sliced out of the raw grid.
    pub table: SpecTripTable,
    /// Billing period text; empty when the label is absent.
    pub billing_period: String,
}

/// Resolved indices of the load-bearing columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecKeyColumns {
    /// Employee identifier column index.
    pub idx_employee_id: usize,
    /// Employee name column index.
    pub idx_employee_name: usize,
    /// Discounted fare column index, when present.
    pub idx_fare: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Grouping

/// One user-declared employee group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEmployeeGroup {
    /// Arbitrary group key.
    pub key: String,
    /// Member identifiers in declaration order.
    pub members: Vec<String>,
}

/// Declared employee groups, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecEmployeeGroups {
    /// Groups in declaration order.
    pub groups: Vec<SpecEmployeeGroup>,
}

impl SpecEmployeeGroups {
    /// Append one group.
    pub fn push(&mut self, key: impl Into<String>, members: Vec<String>) {
        self.groups.push(SpecEmployeeGroup {
            key: key.into(),
            members,
        });
    }

    /// Whether no group is declared.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Employee identifier -> phone extension.
pub type ExtensionMap = BTreeMap<String, String>;

/// Kind of reporting unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumPartitionKind {
    /// Explicit group, carrying its declared key.
    Group(String),
    /// One ungrouped employee.
    Singleton,
}

/// Resolved reporting unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPartition {
    /// Group or singleton.
    pub kind: EnumPartitionKind,
    /// Representative employee identifier.
    pub representative_id: String,
    /// Representative employee name.
    pub representative_name: String,
    /// Identifiers with at least one record, in declaration order.
    pub member_ids: Vec<String>,
    /// Member record indices into the trip table, in table order.
    pub record_indices: Vec<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Aggregation

/// One summary sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSummaryRow {
    /// 1-based sequence number, assigned after sorting.
    pub seq_no: usize,
    /// Representative name.
    pub name: String,
    /// Representative identifier.
    pub employee_id: String,
    /// Phone extension; empty when unknown.
    pub extension: String,
    /// Record count.
    pub count: usize,
    /// Fare total.
    pub fare_total: f64,
    /// Acknowledgement placeholder.
    pub ack: String,
}

/// Grand-total row of the summary sheet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpecSummaryTotal {
    /// Sum of per-row counts.
    pub count: usize,
    /// Sum of per-row fare totals.
    pub fare_total: f64,
}

/// Per-partition aggregation result.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPartitionAggregate {
    /// Partition being reported.
    pub partition: SpecPartition,
    /// Summary row (sequence number still provisional).
    pub summary: SpecSummaryRow,
    /// Record indices in detail-sheet order.
    pub record_indices_ordered: Vec<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
        }
    }
}

/// Named format presets used by the sheet builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportFormats {
    /// Base font + thin border; every generated cell starts here.
    pub base: SpecCellFormat,
    /// Bold, centered title.
    pub title: SpecCellFormat,
    /// Bold emphasis.
    pub bold: SpecCellFormat,
    /// Right-aligned label.
    pub label_right: SpecCellFormat,
    /// Left-aligned value.
    pub value_left: SpecCellFormat,
    /// Centered table cell.
    pub center: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetPlanSpecification

/// One planned cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPlannedCell {
    /// Written value.
    pub value: EnumCellValue,
    /// Cell format.
    pub fmt: SpecCellFormat,
}

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetHorizontalMerge {
    /// Row index where merge is applied.
    pub row_idx: usize,
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
}

/// Fully planned worksheet, independent of the xlsx codec.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetPlan {
    /// Sheet name as written to the workbook.
    pub sheet_name: String,
    /// Planned cells keyed by `(row, col)`.
    pub cells: BTreeMap<(usize, usize), SpecPlannedCell>,
    /// Horizontal merges; the anchor cell value/format is used for the range.
    pub merges: Vec<SpecSheetHorizontalMerge>,
    /// Explicit column widths by column index.
    pub col_widths: BTreeMap<usize, f64>,
}

impl SpecSheetPlan {
    /// Create an empty plan.
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Default::default()
        }
    }

    /// Plan one cell, replacing any previous plan at that position.
    pub fn set_cell(&mut self, row: usize, col: usize, value: EnumCellValue, fmt: &SpecCellFormat) {
        self.cells.insert(
            (row, col),
            SpecPlannedCell {
                value,
                fmt: fmt.clone(),
            },
        );
    }

    /// Plan a text cell.
    pub fn set_text(&mut self, row: usize, col: usize, text: &str, fmt: &SpecCellFormat) {
        self.set_cell(row, col, EnumCellValue::text(text), fmt);
    }

    /// Planned cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&SpecPlannedCell> {
        self.cells.get(&(row, col))
    }

    /// Merge `col_start..=col_end` on `row`; single-cell ranges are ignored.
    pub fn merge(&mut self, row: usize, col_start: usize, col_end: usize) {
        if col_end <= col_start {
            return;
        }
        self.merges.push(SpecSheetHorizontalMerge {
            row_idx: row,
            col_idx_start: col_start,
            col_idx_end: col_end,
        });
    }

    /// Fill every unplanned cell of `rows x cols` with a blank `fmt` cell.
    pub fn fill_blank(&mut self, n_rows: usize, n_cols: usize, fmt: &SpecCellFormat) {
        for row in 0..n_rows {
            for col in 0..n_cols {
                self.cells.entry((row, col)).or_insert_with(|| SpecPlannedCell {
                    value: EnumCellValue::None,
                    fmt: fmt.clone(),
                });
            }
        }
    }

    /// Number of occupied rows (last planned row + 1).
    pub fn height(&self) -> usize {
        self.cells.keys().map(|(row, _)| row + 1).max().unwrap_or(0)
    }

    /// Number of occupied columns (last planned column + 1).
    pub fn width(&self) -> usize {
        self.cells.keys().map(|(_, col)| col + 1).max().unwrap_or(0)
    }

    /// Cells covered by a merge, excluding each merge anchor.
    pub fn merged_cells(&self) -> BTreeSet<(usize, usize)> {
        let mut set_merged = BTreeSet::new();
        for merge in &self.merges {
            for col_idx in (merge.col_idx_start + 1)..=merge.col_idx_end {
                set_merged.insert((merge.row_idx, col_idx));
            }
        }
        set_merged
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportOptions

/// Engine options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReportOptions {
    /// Employee identifier column name.
    pub col_employee_id: String,
    /// Employee name column name.
    pub col_employee_name: String,
    /// Discounted fare column name.
    pub col_fare: String,
    /// Columns always rendered at `width_col_fixed`.
    pub cols_fixed_width: Vec<String>,
    /// Width of `cols_fixed_width` columns.
    pub width_col_fixed: f64,
    /// Customer name printed on detail sheets.
    pub customer_name: String,
    /// Base font size of every generated cell.
    pub font_size: i64,
    /// Separator between representative identifier and name in sheet names.
    pub sheet_name_separator: String,
    /// Generation date; today (local time) when `None`.
    pub date_generated: Option<NaiveDate>,
    /// When set, the raw grid is echoed as the first sheet under this name.
    pub source_sheet_name: Option<String>,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            col_employee_id: C_COL_EMPLOYEE_ID.to_string(),
            col_employee_name: C_COL_EMPLOYEE_NAME.to_string(),
            col_fare: C_COL_FARE.to_string(),
            cols_fixed_width: TUP_COLS_LOCATION.iter().map(ToString::to_string).collect(),
            width_col_fixed: N_WIDTH_COL_LOCATION,
            customer_name: C_CUSTOMER_NAME_DEFAULT.to_string(),
            font_size: N_FONT_SIZE_BASE,
            sheet_name_separator: C_SHEET_NAME_SEPARATOR.to_string(),
            date_generated: None,
            source_sheet_name: None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Non-fatal diagnostics collected during one build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReportDiagnostics {
    /// Non-fatal warnings, in emission order.
    pub warnings: Vec<String>,
}

impl SpecReportDiagnostics {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        tracing::warn!("{}", msg.as_ref());
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Result of one successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBillingReport {
    /// Serialized xlsx workbook.
    pub bytes: Vec<u8>,
    /// Sheet names in final workbook order.
    pub sheet_names: Vec<String>,
    /// Billing period found during segmentation.
    pub billing_period: String,
    /// Summary rows in final order.
    pub summary_rows: Vec<SpecSummaryRow>,
    /// Grand-total row.
    pub summary_total: SpecSummaryTotal,
    /// Non-fatal diagnostics.
    pub diagnostics: SpecReportDiagnostics,
}

/// Fatal build errors. No partial workbook is produced.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A load-bearing column is absent from the trip table.
    #[error("Required column not found: {column:?}")]
    MissingColumn {
        /// Missing column name.
        column: String,
    },
    /// The xlsx codec rejected the workbook.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Row/column index does not fit the Excel grid.
    #[error("{0}")]
    IndexOverflow(String),
    /// The grid source could not be decoded.
    #[error("Invalid grid input: {0}")]
    InvalidGrid(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
