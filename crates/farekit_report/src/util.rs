//! Stateless helper utilities used by the report engine.

use std::collections::BTreeSet;

use crate::conf::{C_OUTPUT_FILE_SUFFIX, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{EnumCellValue, ReportError};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueRendering

/// Render a number the way it reads in a cell: integral values without decimals.
pub fn derive_number_text(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    format!("{x}")
}

/// Render any cell value as text; blank cells render as empty string.
pub fn derive_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) => derive_number_text(*n),
    }
}

/// Numeric reading of a cell; numeric-looking text is accepted.
pub fn parse_cell_number(value: &EnumCellValue) -> Option<f64> {
    match value {
        EnumCellValue::None => None,
        EnumCellValue::Number(n) => n.is_finite().then_some(*n),
        EnumCellValue::String(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite()),
    }
}

/// Display length of text in character units.
pub fn estimate_text_width(s: &str) -> usize {
    s.chars().count()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name`, or `name__<n>` when taken; registers the result in `existing`.
///
/// Excel compares sheet names case-insensitively, so `existing` holds lowercase keys.
pub fn derive_unique_sheet_name(name: &str, existing: &mut BTreeSet<String>) -> String {
    if existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

/// Derive the download file name: `report.xlsx` -> `report_更新.xlsx`.
pub fn derive_output_file_name(file_name: &str) -> String {
    let c_stem = match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls")) =>
        {
            stem
        }
        _ => file_name,
    };
    format!("{c_stem}{C_OUTPUT_FILE_SUFFIX}.xlsx")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

/// Cast a zero-based row index to the codec's row type.
pub fn cast_row_num(value: usize) -> Result<u32, ReportError> {
    u32::try_from(value)
        .map_err(|_| ReportError::IndexOverflow(format!("row index overflow: {value}")))
}

/// Cast a zero-based column index to the codec's column type.
pub fn cast_col_num(value: usize) -> Result<u16, ReportError> {
    u16::try_from(value)
        .map_err(|_| ReportError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
