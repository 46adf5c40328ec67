//! Input loaders: spreadsheet sheets via calamine, Arrow IPC via polars.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};
use farekit_report::{EnumCellValue, RawGrid, derive_raw_grid_from_ipc_bytes};

const TUP_EXT_IPC: [&str; 3] = ["arrow", "ipc", "feather"];

/// Raw grid loaded from one input sheet.
pub struct LoadedGrid {
    /// Name of the sheet the grid came from.
    pub sheet_name: String,
    /// Cell grid anchored at A1.
    pub grid: RawGrid,
}

fn is_ipc_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TUP_EXT_IPC.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

/// Sheet names of a spreadsheet input; an IPC file has one unnamed sheet.
pub fn list_sheet_names(path: &Path) -> Result<Vec<String>> {
    if is_ipc_path(path) {
        return Ok(vec![derive_ipc_sheet_name(path)]);
    }
    let workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Load `sheet` (or the first sheet) of `path` as a raw grid.
pub fn load_raw_grid(path: &Path, sheet: Option<&str>) -> Result<LoadedGrid> {
    if is_ipc_path(path) {
        let v_ipc = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let grid = derive_raw_grid_from_ipc_bytes(&v_ipc, false)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        return Ok(LoadedGrid {
            sheet_name: derive_ipc_sheet_name(path),
            grid,
        });
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let l_sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(c_name) if l_sheet_names.iter().any(|s| s == c_name) => c_name.to_string(),
        Some(c_name) => bail!(
            "Sheet {c_name:?} not found in {}; available: {}",
            path.display(),
            l_sheet_names.join(", ")
        ),
        None => match l_sheet_names.first() {
            Some(c_name) => c_name.clone(),
            None => bail!("Workbook {} contains no sheets", path.display()),
        },
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet {sheet_name:?}"))?;
    tracing::debug!(sheet = %sheet_name, size = ?range.get_size(), "loaded sheet");

    Ok(LoadedGrid {
        grid: derive_raw_grid_from_range(&range),
        sheet_name,
    })
}

fn derive_ipc_sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "Sheet1".to_string())
}

/// Convert a calamine range to a grid anchored at A1.
///
/// Calamine ranges start at the first used cell; leading empty rows and
/// columns are restored so row/column positions match the sheet.
pub fn derive_raw_grid_from_range(range: &Range<Data>) -> RawGrid {
    let Some((n_row_start, n_col_start)) = range.start() else {
        return RawGrid::new();
    };
    let n_col_pad = n_col_start as usize;

    let mut grid: RawGrid = vec![Vec::new(); n_row_start as usize];
    for row in range.rows() {
        let mut l_row = vec![EnumCellValue::None; n_col_pad];
        l_row.extend(row.iter().map(derive_cell_value_from_data));
        grid.push(l_row);
    }
    grid
}

fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(s) if s.is_empty() => EnumCellValue::None,
        Data::String(s) => EnumCellValue::String(s.clone()),
        Data::Float(n) => EnumCellValue::Number(*n),
        Data::Int(n) => EnumCellValue::Number(*n as f64),
        Data::Bool(b) => EnumCellValue::text(if *b { "True" } else { "False" }),
        Data::DateTime(dt) => EnumCellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => EnumCellValue::String(s.clone()),
        Data::Error(err) => EnumCellValue::String(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_raw_grid_from_range_pads_to_a1() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("列帳期間：".to_string()));
        range.set_value((2, 3), Data::Float(100.0));
        range.set_value((2, 2), Data::Int(7));

        let grid = derive_raw_grid_from_range(&range);
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_empty());
        assert_eq!(grid[1][2], EnumCellValue::text("列帳期間："));
        assert_eq!(grid[1][3], EnumCellValue::None);
        assert_eq!(grid[2][0], EnumCellValue::None);
        assert_eq!(grid[2][2], EnumCellValue::Number(7.0));
        assert_eq!(grid[2][3], EnumCellValue::Number(100.0));
    }

    #[test]
    fn test_derive_raw_grid_from_empty_range() {
        let range: Range<Data> = Range::empty();
        assert!(derive_raw_grid_from_range(&range).is_empty());
    }

    #[test]
    fn test_is_ipc_path() {
        assert!(is_ipc_path(Path::new("trips.arrow")));
        assert!(is_ipc_path(Path::new("trips.IPC")));
        assert!(!is_ipc_path(Path::new("trips.xlsx")));
        assert_eq!(derive_ipc_sheet_name(Path::new("/tmp/trips.arrow")), "trips");
    }
}
