//! Table segmentation: locate the trip table inside a schema-less raw grid.
//!
//! The data region is delimited by two sentinel rows:
//! - a row with any text cell containing [`C_MARKER_TRIP_DETAIL`] (start),
//! - a row whose first cell starts with [`C_MARKER_TOTAL`] (end).
//!
//! The end marker is only searched below the start marker; total lines
//! above the trip table never close it.
//!
//! Markers are matched against typed text cells only; numbers and blanks never match.

use tracing::debug;

use crate::conf::{C_MARKER_BILLING_PERIOD, C_MARKER_TOTAL, C_MARKER_TRIP_DETAIL};
use crate::spec::{EnumCellValue, SpecReportDiagnostics, SpecSegmentedTable, SpecTripTable};
use crate::util::derive_cell_text;

/// Slice the trip table and billing period out of `grid`.
///
/// Missing markers are not fatal: without a start marker the whole grid is
/// taken as the table (first row as header) and a warning is recorded.
pub fn segment_raw_grid(
    grid: &[Vec<EnumCellValue>],
    diagnostics: &mut SpecReportDiagnostics,
) -> SpecSegmentedTable {
    let n_row_start = grid.iter().position(|row| is_trip_detail_marker_row(row));
    let n_row_end = match n_row_start {
        Some(n_start) => grid[n_start + 1..]
            .iter()
            .position(|row| is_total_marker_row(row))
            .map(|n_offset| n_start + 1 + n_offset),
        None => grid.iter().position(|row| is_total_marker_row(row)),
    };
    let billing_period = find_billing_period(grid);

    debug!(
        row_start = ?n_row_start,
        row_end = ?n_row_end,
        billing_period = %billing_period,
        "segmenting raw grid"
    );

    let table = match (n_row_start, n_row_end) {
        (Some(n_start), Some(n_end)) => promote_header_row(&grid[n_start + 1..n_end]),
        (Some(n_start), None) => promote_header_row(&grid[n_start + 1..]),
        (None, _) => {
            diagnostics.warn(format!(
                "Marker {C_MARKER_TRIP_DETAIL:?} not found; using the full grid as the trip table."
            ));
            promote_header_row(grid)
        }
    };

    SpecSegmentedTable {
        table,
        billing_period,
    }
}

/// Whether any text cell of `row` contains the trip-detail marker.
pub fn is_trip_detail_marker_row(row: &[EnumCellValue]) -> bool {
    row.iter()
        .filter_map(EnumCellValue::as_str)
        .any(|s| s.contains(C_MARKER_TRIP_DETAIL))
}

/// Whether the first cell of `row` is text starting with the total marker.
pub fn is_total_marker_row(row: &[EnumCellValue]) -> bool {
    row.first()
        .and_then(EnumCellValue::as_str)
        .is_some_and(|s| s.starts_with(C_MARKER_TOTAL))
}

/// Second-column value of the first row labelled with the billing-period marker.
pub fn find_billing_period(grid: &[Vec<EnumCellValue>]) -> String {
    grid.iter()
        .find(|row| {
            row.iter()
                .filter_map(EnumCellValue::as_str)
                .any(|s| s.contains(C_MARKER_BILLING_PERIOD))
        })
        .and_then(|row| row.get(1))
        .map(derive_cell_text)
        .unwrap_or_default()
}

fn promote_header_row(rows: &[Vec<EnumCellValue>]) -> SpecTripTable {
    let Some((row_header, rows_body)) = rows.split_first() else {
        return SpecTripTable::default();
    };
    let l_colnames = row_header.iter().map(derive_cell_text).collect();
    SpecTripTable::new(l_colnames, rows_body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RawGrid;

    fn text_row(cells: &[&str]) -> Vec<EnumCellValue> {
        cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    EnumCellValue::None
                } else {
                    EnumCellValue::text(*c)
                }
            })
            .collect()
    }

    fn build_vendor_grid() -> RawGrid {
        vec![
            text_row(&["台灣大車隊", "", ""]),
            text_row(&["列帳期間：", "2024/05/01~2024/05/31", ""]),
            text_row(&["企業會員旅次明細表", "", ""]),
            text_row(&["員工編號", "員工姓名", "折扣後車資"]),
            vec![
                EnumCellValue::text("001"),
                EnumCellValue::text("Alice"),
                EnumCellValue::Number(100.0),
            ],
            vec![
                EnumCellValue::text("002"),
                EnumCellValue::text("Bob"),
                EnumCellValue::Number(200.0),
            ],
            text_row(&["總共：2筆", "", ""]),
            text_row(&["footer", "", ""]),
        ]
    }

    #[test]
    fn test_segment_raw_grid_slices_between_markers() {
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&build_vendor_grid(), &mut diagnostics);

        assert_eq!(segmented.billing_period, "2024/05/01~2024/05/31");
        assert_eq!(segmented.table.columns, vec!["員工編號", "員工姓名", "折扣後車資"]);
        assert_eq!(segmented.table.height(), 2);
        assert_eq!(segmented.table.records[1][1], EnumCellValue::text("Bob"));
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_segment_raw_grid_without_end_marker_takes_rest_of_grid() {
        let mut grid = build_vendor_grid();
        grid.truncate(6);
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&grid, &mut diagnostics);

        assert_eq!(segmented.table.height(), 2);
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_segment_raw_grid_without_markers_falls_back_with_warning() {
        let grid = vec![
            text_row(&["員工編號", "員工姓名"]),
            text_row(&["001", "Alice"]),
        ];
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&grid, &mut diagnostics);

        assert_eq!(segmented.table.columns, vec!["員工編號", "員工姓名"]);
        assert_eq!(segmented.table.height(), 1);
        assert_eq!(segmented.billing_period, "");
        assert_eq!(diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_segment_raw_grid_is_idempotent_on_segmented_table() {
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&build_vendor_grid(), &mut diagnostics);
        let resegmented = segment_raw_grid(&segmented.table.to_raw_grid(), &mut diagnostics);

        assert_eq!(resegmented.table, segmented.table);
    }

    #[test]
    fn test_segment_raw_grid_edge_cases() {
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&[], &mut diagnostics);
        assert_eq!(segmented.table, SpecTripTable::default());

        let grid = vec![text_row(&["x"]), text_row(&["旅次明細表"])];
        let segmented = segment_raw_grid(&grid, &mut diagnostics);
        assert!(segmented.table.columns.is_empty());
        assert_eq!(segmented.table.height(), 0);

        let grid = vec![text_row(&["旅次明細表"]), text_row(&["員工編號", "員工編號"])];
        let segmented = segment_raw_grid(&grid, &mut diagnostics);
        assert_eq!(segmented.table.columns, vec!["員工編號", "員工編號"]);
        assert_eq!(segmented.table.position("員工編號"), Some(0));
    }

    #[test]
    fn test_segment_raw_grid_ignores_end_marker_above_start() {
        let mut grid = build_vendor_grid();
        grid.insert(0, text_row(&["總共：上期", "", ""]));
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&grid, &mut diagnostics);

        assert_eq!(segmented.table.columns, vec!["員工編號", "員工姓名", "折扣後車資"]);
        assert_eq!(segmented.table.height(), 2);
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_segment_raw_grid_end_marker_right_after_start_yields_empty_region() {
        let grid = vec![
            text_row(&["旅次明細表", ""]),
            text_row(&["總共：0", ""]),
            text_row(&["員工編號", "員工姓名"]),
        ];
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&grid, &mut diagnostics);

        assert_eq!(segmented.table, SpecTripTable::default());
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_segment_raw_grid_end_marker_only_falls_back_with_warning() {
        let grid = vec![
            text_row(&["員工編號", "員工姓名"]),
            text_row(&["001", "Alice"]),
            text_row(&["總共：1", ""]),
        ];
        let mut diagnostics = SpecReportDiagnostics::default();
        let segmented = segment_raw_grid(&grid, &mut diagnostics);

        assert_eq!(segmented.table.columns, vec!["員工編號", "員工姓名"]);
        assert_eq!(segmented.table.height(), 2);
        assert_eq!(segmented.table.records[1][0], EnumCellValue::text("總共：1"));
        assert_eq!(diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_marker_predicates_ignore_non_text_cells_and_later_columns() {
        assert!(!is_total_marker_row(&[
            EnumCellValue::None,
            EnumCellValue::text("總共：3")
        ]));
        assert!(is_total_marker_row(&text_row(&["總共：3"])));
        assert!(!is_trip_detail_marker_row(&[EnumCellValue::Number(1.0)]));
        assert!(is_trip_detail_marker_row(&text_row(&["", "旅次明細表 (5月)"])));
    }
}
