//! Workbook assembler: runs the report pipeline and serializes the workbook.

use std::collections::{BTreeSet, HashMap};

use chrono::Local;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{debug, info};

use crate::aggregate::{aggregate_partitions, finalize_summary_rows};
use crate::conf::{C_SUMMARY_SHEET_NAME, derive_default_report_formats};
use crate::group::{list_employee_ids, resolve_key_columns, resolve_partitions};
use crate::segment::segment_raw_grid;
use crate::sheet::{plan_detail_sheet, plan_source_sheet, plan_summary_sheet};
use crate::spec::{
    EnumCellValue, ExtensionMap, ReportError, SpecBillingReport, SpecCellFormat,
    SpecEmployeeGroups, SpecKeyColumns, SpecReportDiagnostics, SpecReportFormats,
    SpecReportOptions, SpecSegmentedTable, SpecSheetPlan, SpecTripTable,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_unique_sheet_name, sanitize_sheet_name,
};

/// Billing workbook builder bound to one set of options.
///
/// Each [`Self::write`] call is independent; no state is carried between builds.
#[derive(Debug, Clone)]
pub struct BillingWorkbookWriter {
    options: SpecReportOptions,
    formats: SpecReportFormats,
}

impl Default for BillingWorkbookWriter {
    fn default() -> Self {
        Self::new(SpecReportOptions::default())
    }
}

impl BillingWorkbookWriter {
    /// Create a writer; format presets derive from `options.font_size`.
    pub fn new(options: SpecReportOptions) -> Self {
        let formats = derive_default_report_formats(options.font_size);
        Self { options, formats }
    }

    /// Options this writer was built with.
    pub fn options(&self) -> &SpecReportOptions {
        &self.options
    }

    /// Build the billing workbook for `grid`.
    ///
    /// Sheet order: optional source echo, summary, then detail sheets sorted
    /// by representative identifier, the same order as the summary rows.
    pub fn write(
        &self,
        grid: &[Vec<EnumCellValue>],
        groups: &SpecEmployeeGroups,
        extensions: &ExtensionMap,
    ) -> Result<SpecBillingReport, ReportError> {
        let mut diagnostics = SpecReportDiagnostics::default();

        let SpecSegmentedTable {
            table,
            billing_period,
        } = segment_raw_grid(grid, &mut diagnostics);
        let columns = resolve_key_columns(&table, &self.options)?;
        if columns.idx_fare.is_none() {
            debug!(column = %self.options.col_fare, "fare column absent; totals are zero");
        }

        let partitions = resolve_partitions(&table, &columns, groups, &mut diagnostics);
        let aggregates = aggregate_partitions(&table, &columns, partitions, extensions);
        let (summary_rows, summary_total) = finalize_summary_rows(&aggregates);
        check_missing_extensions(&table, &columns, extensions, &mut diagnostics);

        let date_generated = self
            .options
            .date_generated
            .unwrap_or_else(|| Local::now().date_naive());

        let mut set_sheet_names_existing = BTreeSet::new();
        let mut l_plans_leading: Vec<SpecSheetPlan> = Vec::new();
        if let Some(c_source_name) = &self.options.source_sheet_name {
            let c_name = self.derive_sheet_name(
                c_source_name,
                &mut set_sheet_names_existing,
                &mut diagnostics,
            );
            l_plans_leading.push(plan_source_sheet(&c_name, grid));
        }
        let c_summary_name = self.derive_sheet_name(
            C_SUMMARY_SHEET_NAME,
            &mut set_sheet_names_existing,
            &mut diagnostics,
        );
        l_plans_leading.push(plan_summary_sheet(
            &c_summary_name,
            &summary_rows,
            &summary_total,
            &billing_period,
            date_generated,
            &self.formats,
        ));

        let mut l_plans_detail: Vec<(&str, SpecSheetPlan)> =
            Vec::with_capacity(aggregates.len());
        for aggregate in &aggregates {
            let c_name_raw = format!(
                "{}{}{}",
                aggregate.partition.representative_id,
                self.options.sheet_name_separator,
                aggregate.partition.representative_name
            );
            let c_name = self.derive_sheet_name(
                &c_name_raw,
                &mut set_sheet_names_existing,
                &mut diagnostics,
            );
            let plan = plan_detail_sheet(
                &c_name,
                &table,
                aggregate,
                &billing_period,
                &self.options,
                &self.formats,
            );
            l_plans_detail.push((aggregate.partition.representative_id.as_str(), plan));
        }
        l_plans_detail.sort_by(|(c_id_a, _), (c_id_b, _)| c_id_a.cmp(c_id_b));

        let l_plans: Vec<SpecSheetPlan> = l_plans_leading
            .into_iter()
            .chain(l_plans_detail.into_iter().map(|(_, plan)| plan))
            .collect();
        let bytes = render_workbook(&l_plans)?;

        info!(
            n_sheets = l_plans.len(),
            n_records = table.height(),
            count = summary_total.count,
            fare_total = summary_total.fare_total,
            n_bytes = bytes.len(),
            "billing workbook assembled"
        );

        Ok(SpecBillingReport {
            bytes,
            sheet_names: l_plans.into_iter().map(|plan| plan.sheet_name).collect(),
            billing_period,
            summary_rows,
            summary_total,
            diagnostics,
        })
    }

    fn derive_sheet_name(
        &self,
        name: &str,
        existing: &mut BTreeSet<String>,
        diagnostics: &mut SpecReportDiagnostics,
    ) -> String {
        let c_name_sanitized = sanitize_sheet_name(name, "_");
        let c_name_unique = derive_unique_sheet_name(&c_name_sanitized, existing);
        if c_name_unique != c_name_sanitized {
            diagnostics.warn(format!(
                "Sheet name {c_name_sanitized:?} already exists; renamed to {c_name_unique:?}."
            ));
        }
        c_name_unique
    }
}

/// Build the billing workbook with default options.
pub fn generate_billing_report(
    grid: &[Vec<EnumCellValue>],
    groups: &SpecEmployeeGroups,
    extensions: &ExtensionMap,
) -> Result<SpecBillingReport, ReportError> {
    BillingWorkbookWriter::default().write(grid, groups, extensions)
}

fn check_missing_extensions(
    table: &SpecTripTable,
    columns: &SpecKeyColumns,
    extensions: &ExtensionMap,
    diagnostics: &mut SpecReportDiagnostics,
) {
    let l_ids_missing: Vec<String> = list_employee_ids(table, columns)
        .into_iter()
        .filter(|c_id| !extensions.contains_key(c_id))
        .collect();
    if !l_ids_missing.is_empty() {
        diagnostics.warn(format!(
            "Employees without an extension: {}",
            l_ids_missing.join(", ")
        ));
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Rendering

/// Render sheet plans, in order, into serialized xlsx bytes.
pub fn render_workbook(plans: &[SpecSheetPlan]) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let mut dict_formats: HashMap<SpecCellFormat, Format> = HashMap::new();
    for plan in plans {
        let worksheet = workbook.add_worksheet();
        render_sheet_plan(worksheet, plan, &mut dict_formats)?;
    }
    Ok(workbook.save_to_buffer()?)
}

/// Write one plan into `worksheet`.
///
/// Merges go first with empty text; their anchor cells are then written like
/// any other cell, and cells covered by a merge are skipped.
pub fn render_sheet_plan(
    worksheet: &mut Worksheet,
    plan: &SpecSheetPlan,
    dict_formats: &mut HashMap<SpecCellFormat, Format>,
) -> Result<(), ReportError> {
    worksheet.set_name(&plan.sheet_name)?;

    for merge in &plan.merges {
        let fmt_spec = plan
            .cell(merge.row_idx, merge.col_idx_start)
            .map(|cell| cell.fmt.clone())
            .unwrap_or_default();
        let format = derive_cached_format(dict_formats, &fmt_spec);
        worksheet.merge_range(
            cast_row_num(merge.row_idx)?,
            cast_col_num(merge.col_idx_start)?,
            cast_row_num(merge.row_idx)?,
            cast_col_num(merge.col_idx_end)?,
            "",
            &format,
        )?;
    }

    let set_merged = plan.merged_cells();
    for ((row_idx, col_idx), cell) in &plan.cells {
        if set_merged.contains(&(*row_idx, *col_idx)) {
            continue;
        }
        let format = derive_cached_format(dict_formats, &cell.fmt);
        write_cell_with_format(worksheet, *row_idx, *col_idx, &cell.value, &format)?;
    }

    for (col_idx, n_width) in &plan.col_widths {
        worksheet.set_column_width(cast_col_num(*col_idx)?, *n_width)?;
    }
    Ok(())
}

fn derive_cached_format(
    dict_formats: &mut HashMap<SpecCellFormat, Format>,
    spec: &SpecCellFormat,
) -> Format {
    dict_formats
        .entry(spec.clone())
        .or_insert_with(|| derive_rust_xlsx_format(spec))
        .clone()
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), ReportError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

/// Translate a format spec into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold == Some(true) {
        format = format.set_bold();
    }
    if let Some(align) = spec.align.as_deref().and_then(derive_format_align) {
        format = format.set_align(align);
    }
    if let Some(align) = spec.valign.as_deref().and_then(derive_format_align) {
        format = format.set_align(align);
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
