//! Sheet builder: plans detail, summary and source-echo sheets as plain cell maps.
//!
//! Detail sheet layout, top to bottom:
//! - title (merged across all data columns)
//! - customer name and billing period (label in A, value merged from C)
//! - header row, then one row per record
//! - eight-row statistics block, see [`EnumStatsRow`]
//!
//! Every cell of the occupied rectangle carries the base font and a thin border.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::conf::{
    C_CURRENCY_SUFFIX, C_DETAIL_TITLE, C_LABEL_BILLING_PERIOD, C_LABEL_CUSTOMER,
    C_LABEL_GRAND_TOTAL, C_LABEL_RECEIPT_DATE, C_SUMMARY_TITLE, N_WIDTH_PAD_BODY,
    N_WIDTH_PAD_HEADER, TUP_SUMMARY_HEADER,
};
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecPartitionAggregate, SpecReportFormats, SpecReportOptions,
    SpecSheetPlan, SpecSummaryRow, SpecSummaryTotal, SpecTripTable,
};
use crate::util::{derive_cell_text, derive_number_text, estimate_text_width};

const N_ROW_TITLE: usize = 0;
const N_ROW_CUSTOMER: usize = 1;
const N_ROW_BILLING_PERIOD: usize = 2;
const N_ROW_HEADER: usize = 3;
const N_ROW_BODY_START: usize = 4;
const N_COL_INFO_VALUE: usize = 2;

const N_COL_STATS_LABEL: usize = 0;
const N_COL_STATS_COUNT: usize = 1;
const N_COL_STATS_VALUE: usize = 6;
const N_COL_STATS_AMOUNT: usize = 7;
/// Columns spanned by the statistics block (A..=H).
pub const N_COLS_STATS_BLOCK: usize = 8;

const N_COLS_SUMMARY: usize = 7;
const N_ROWS_SUMMARY_FIXED: usize = 3;
const N_COL_SUMMARY_VALUE: usize = 3;

////////////////////////////////////////////////////////////////////////////////
// #region StatisticsBlock

/// Statistics block rows, in layout order; the discriminant is the row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStatsRow {
    /// Record count and fare after discount.
    TotalCount = 0,
    /// Empty separator row.
    Spacer = 1,
    /// Fare total (transport service fee).
    FareTotal = 2,
    /// Ticket printing fee.
    TicketPrintingFee = 3,
    /// Late fee.
    LateFee = 4,
    /// Other fees.
    OtherFees = 5,
    /// Amount payable this period.
    AmountPayable = 6,
    /// Special fee.
    SpecialFee = 7,
}

impl EnumStatsRow {
    /// All rows in layout order.
    pub const LAYOUT: [EnumStatsRow; 8] = [
        Self::TotalCount,
        Self::Spacer,
        Self::FareTotal,
        Self::TicketPrintingFee,
        Self::LateFee,
        Self::OtherFees,
        Self::AmountPayable,
        Self::SpecialFee,
    ];

    /// Row offset from the first statistics row.
    pub fn offset(self) -> usize {
        self as usize
    }

    /// Column-A label.
    pub fn label(self) -> &'static str {
        match self {
            Self::TotalCount => "總筆數",
            Self::Spacer => "",
            Self::FareTotal => "*車資總計(運送服務費)：",
            Self::TicketPrintingFee => "乘車券印製費：",
            Self::LateFee => "滯納金：",
            Self::OtherFees => "其它費用：",
            Self::AmountPayable => "本期應繳帳款：",
            Self::SpecialFee => "特殊費用：",
        }
    }

    /// Columns rendered bold on this row.
    pub fn cols_bold(self) -> &'static [usize] {
        match self {
            Self::TotalCount => &[
                N_COL_STATS_LABEL,
                N_COL_STATS_COUNT,
                N_COL_STATS_VALUE,
                N_COL_STATS_AMOUNT,
            ],
            Self::AmountPayable => &[N_COL_STATS_LABEL, N_COL_STATS_VALUE],
            _ => &[],
        }
    }

    fn plan_cells(self, count: usize, fare_total: f64) -> Vec<(usize, EnumCellValue)> {
        let c_amount = format_amount(fare_total);
        let c_zero = format_amount(0.0);
        let value = match self {
            Self::Spacer => return vec![],
            Self::TotalCount => {
                return vec![
                    (N_COL_STATS_LABEL, EnumCellValue::text(self.label())),
                    (N_COL_STATS_COUNT, EnumCellValue::Number(count as f64)),
                    (N_COL_STATS_VALUE, EnumCellValue::text("折扣後：")),
                    (N_COL_STATS_AMOUNT, EnumCellValue::Number(fare_total)),
                ];
            }
            Self::FareTotal | Self::AmountPayable => c_amount,
            Self::TicketPrintingFee | Self::LateFee | Self::OtherFees | Self::SpecialFee => c_zero,
        };
        vec![
            (N_COL_STATS_LABEL, EnumCellValue::text(self.label())),
            (N_COL_STATS_VALUE, EnumCellValue::String(value)),
        ]
    }
}

/// Render an amount as `"<amount>元"`.
pub fn format_amount(amount: f64) -> String {
    format!("{}{C_CURRENCY_SUFFIX}", derive_number_text(amount))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DetailSheet

/// Column widths for a detail sheet.
///
/// Width is `max(longest body text + 4, header text + 6)`, except the
/// configured fixed-width columns.
pub fn derive_detail_column_widths(
    table: &SpecTripTable,
    record_indices: &[usize],
    options: &SpecReportOptions,
) -> BTreeMap<usize, f64> {
    let mut dict_widths = BTreeMap::new();
    for (idx_col, c_colname) in table.columns.iter().enumerate() {
        if options.cols_fixed_width.contains(c_colname) {
            dict_widths.insert(idx_col, options.width_col_fixed);
            continue;
        }
        let n_width_body = record_indices
            .iter()
            .map(|idx| estimate_text_width(&derive_cell_text(&table.records[*idx][idx_col])))
            .max()
            .unwrap_or(0);
        let n_width = usize::max(
            n_width_body + N_WIDTH_PAD_BODY,
            estimate_text_width(c_colname) + N_WIDTH_PAD_HEADER,
        );
        dict_widths.insert(idx_col, n_width as f64);
    }
    dict_widths
}

/// Plan one detail sheet for a partition.
pub fn plan_detail_sheet(
    sheet_name: &str,
    table: &SpecTripTable,
    aggregate: &SpecPartitionAggregate,
    billing_period: &str,
    options: &SpecReportOptions,
    formats: &SpecReportFormats,
) -> SpecSheetPlan {
    let mut plan = SpecSheetPlan::new(sheet_name);
    let n_col_last = table.width().saturating_sub(1);

    plan.set_text(N_ROW_TITLE, 0, C_DETAIL_TITLE, &formats.title);
    plan.merge(N_ROW_TITLE, 0, n_col_last);

    for (n_row, c_label, c_value) in [
        (N_ROW_CUSTOMER, C_LABEL_CUSTOMER, options.customer_name.as_str()),
        (N_ROW_BILLING_PERIOD, C_LABEL_BILLING_PERIOD, billing_period),
    ] {
        plan.set_text(n_row, 0, c_label, &formats.base);
        plan.set_text(n_row, N_COL_INFO_VALUE, c_value, &formats.base);
        plan.merge(n_row, N_COL_INFO_VALUE, n_col_last);
    }

    for (idx_col, c_colname) in table.columns.iter().enumerate() {
        plan.set_text(N_ROW_HEADER, idx_col, c_colname, &formats.base);
    }

    for (n_offset, idx_record) in aggregate.record_indices_ordered.iter().enumerate() {
        for (idx_col, value) in table.records[*idx_record].iter().enumerate() {
            plan.set_cell(N_ROW_BODY_START + n_offset, idx_col, value.clone(), &formats.base);
        }
    }

    let n_row_stats = N_ROW_BODY_START + aggregate.record_indices_ordered.len();
    for stats_row in EnumStatsRow::LAYOUT {
        let n_row = n_row_stats + stats_row.offset();
        let l_cells = stats_row.plan_cells(aggregate.summary.count, aggregate.summary.fare_total);
        for (idx_col, value) in l_cells {
            let fmt = if stats_row.cols_bold().contains(&idx_col) {
                &formats.bold
            } else {
                &formats.base
            };
            plan.set_cell(n_row, idx_col, value, fmt);
        }
    }

    let n_rows_total = n_row_stats + EnumStatsRow::LAYOUT.len();
    let n_cols_total = usize::max(table.width(), N_COLS_STATS_BLOCK);
    plan.fill_blank(n_rows_total, n_cols_total, &formats.base);

    plan.col_widths =
        derive_detail_column_widths(table, &aggregate.record_indices_ordered, options);
    plan
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SummarySheet

/// Plan the summary sheet: three fixed rows, header, sorted rows, grand total.
pub fn plan_summary_sheet(
    sheet_name: &str,
    rows: &[SpecSummaryRow],
    total: &SpecSummaryTotal,
    billing_period: &str,
    date_generated: NaiveDate,
    formats: &SpecReportFormats,
) -> SpecSheetPlan {
    let mut plan = SpecSheetPlan::new(sheet_name);

    let l_fixed_rows = [
        (C_SUMMARY_TITLE, date_generated.format("%Y/%m").to_string()),
        (C_LABEL_BILLING_PERIOD, billing_period.to_string()),
        (C_LABEL_RECEIPT_DATE, date_generated.format("%Y/%m/%d").to_string()),
    ];
    for (n_row, (c_label, c_value)) in l_fixed_rows.iter().enumerate() {
        plan.set_text(n_row, 0, c_label, &formats.label_right);
        plan.set_text(n_row, N_COL_SUMMARY_VALUE, c_value, &formats.value_left);
        plan.merge(n_row, 0, N_COL_SUMMARY_VALUE - 1);
        plan.merge(n_row, N_COL_SUMMARY_VALUE, N_COLS_SUMMARY - 1);
    }

    let n_row_header = N_ROWS_SUMMARY_FIXED;
    for (idx_col, c_label) in TUP_SUMMARY_HEADER.iter().enumerate() {
        plan.set_text(n_row_header, idx_col, c_label, &formats.center);
    }

    for (n_offset, row) in rows.iter().enumerate() {
        let n_row = n_row_header + 1 + n_offset;
        let l_values = [
            EnumCellValue::Number(row.seq_no as f64),
            EnumCellValue::text(row.name.as_str()),
            EnumCellValue::text(row.employee_id.as_str()),
            EnumCellValue::text(row.extension.as_str()),
            EnumCellValue::Number(row.count as f64),
            EnumCellValue::Number(row.fare_total),
            EnumCellValue::text(row.ack.as_str()),
        ];
        for (idx_col, value) in l_values.into_iter().enumerate() {
            plan.set_cell(n_row, idx_col, value, &formats.center);
        }
    }

    let n_row_total = n_row_header + 1 + rows.len();
    plan.set_text(n_row_total, 0, C_LABEL_GRAND_TOTAL, &formats.center);
    plan.merge(n_row_total, 0, 3);
    plan.set_cell(n_row_total, 4, EnumCellValue::Number(total.count as f64), &formats.center);
    plan.set_cell(n_row_total, 5, EnumCellValue::Number(total.fare_total), &formats.center);

    plan.fill_blank(n_row_header, N_COLS_SUMMARY, &formats.base);
    plan.fill_blank(n_row_total + 1, N_COLS_SUMMARY, &formats.center);
    plan
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SourceSheet

/// Plan a verbatim, unstyled copy of the raw grid.
pub fn plan_source_sheet(sheet_name: &str, grid: &[Vec<EnumCellValue>]) -> SpecSheetPlan {
    let mut plan = SpecSheetPlan::new(sheet_name);
    let fmt_plain = SpecCellFormat::default();
    for (idx_row, row) in grid.iter().enumerate() {
        for (idx_col, value) in row.iter().enumerate() {
            if !value.is_none() {
                plan.set_cell(idx_row, idx_col, value.clone(), &fmt_plain);
            }
        }
    }
    plan
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
