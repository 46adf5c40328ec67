//! `farekit_report` v1:
//! Ride-billing report engine, raw vendor grid in, billing workbook out.
//!
//! Pipeline modules:
//! - `conf`      : fixed labels, column presets and default format presets
//! - `spec`      : data model, options and error types
//! - `util`      : pure helper functions
//! - `grid`      : polars `DataFrame` / Arrow IPC to raw grid
//! - `input`     : extension and group free-text parsing
//! - `segment`   : trip table segmentation by sentinel markers
//! - `group`     : partition resolution (groups, then singletons)
//! - `aggregate` : counts, fare totals, summary ordering
//! - `sheet`     : detail/summary sheet plans
//! - `writer`    : workbook assembly through `rust_xlsxwriter`
pub mod aggregate;
pub mod conf;
pub mod grid;
pub mod group;
pub mod input;
pub mod segment;
pub mod sheet;
pub mod spec;
pub mod util;
pub mod writer;

pub use aggregate::{aggregate_partitions, calculate_fare_total, finalize_summary_rows};
pub use conf::{C_SUMMARY_SHEET_NAME, N_LEN_EXCEL_SHEET_NAME_MAX, derive_default_report_formats};
pub use grid::{derive_raw_grid_from_dataframe, derive_raw_grid_from_ipc_bytes};
pub use group::{list_employee_ids, resolve_key_columns, resolve_partitions};
pub use input::{parse_employee_groups, parse_extension_map};
pub use segment::segment_raw_grid;
pub use sheet::{EnumStatsRow, plan_detail_sheet, plan_source_sheet, plan_summary_sheet};
pub use spec::{
    EnumCellValue, EnumPartitionKind, ExtensionMap, RawGrid, ReportError, SpecBillingReport,
    SpecCellFormat, SpecEmployeeGroups, SpecPartition, SpecReportDiagnostics, SpecReportOptions,
    SpecSheetPlan, SpecSummaryRow, SpecSummaryTotal, SpecTripTable,
};
pub use util::{derive_output_file_name, sanitize_sheet_name};
pub use writer::{BillingWorkbookWriter, generate_billing_report, render_workbook};
