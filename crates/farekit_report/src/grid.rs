//! Cell grid loaders for polars inputs.
//!
//! A loaded grid is header-less: column names of the frame are either
//! dropped or emitted as the first grid row, since the segmenter finds the
//! real header by marker.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::spec::{EnumCellValue, RawGrid, ReportError};

/// Convert a frame to a raw grid, optionally leading with its column names.
pub fn derive_raw_grid_from_dataframe(
    df: &DataFrame,
    if_include_header: bool,
) -> Result<RawGrid, ReportError> {
    let n_height = df.height();
    let n_width = df.width();
    let l_cols = df.get_columns();

    let mut grid: RawGrid = Vec::with_capacity(n_height + usize::from(if_include_header));
    if if_include_header {
        grid.push(
            df.get_column_names_str()
                .into_iter()
                .map(EnumCellValue::text)
                .collect(),
        );
    }

    for n_idx_row in 0..n_height {
        let mut l_row = Vec::with_capacity(n_width);
        for col in l_cols {
            let value = col.get(n_idx_row).map_err(|err| {
                ReportError::InvalidGrid(format!("Failed to read cell ({n_idx_row}): {err}"))
            })?;
            l_row.push(derive_cell_value_from_any_value(value));
        }
        grid.push(l_row);
    }

    Ok(grid)
}

/// Decode Arrow IPC bytes and convert them to a raw grid.
pub fn derive_raw_grid_from_ipc_bytes(
    v_ipc_df: &[u8],
    if_include_header: bool,
) -> Result<RawGrid, ReportError> {
    let df = IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| ReportError::InvalidGrid(format!("Failed to decode IPC payload: {err}")))?;
    derive_raw_grid_from_dataframe(&df, if_include_header)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) if val.is_empty() => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) if val.is_empty() => EnumCellValue::None,
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}
