use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use farekit_report::util::derive_number_text;
use farekit_report::{
    BillingWorkbookWriter, EnumCellValue, ExtensionMap, ReportError, SpecBillingReport,
    SpecEmployeeGroups, SpecReportOptions, generate_billing_report, parse_employee_groups,
    parse_extension_map,
};

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

fn trip_row(c_id: &str, c_name: &str, c_location: &str, n_fare: f64) -> Vec<EnumCellValue> {
    vec![
        EnumCellValue::text(c_id),
        EnumCellValue::text(c_name),
        EnumCellValue::text(c_location),
        EnumCellValue::Number(n_fare),
    ]
}

fn build_vendor_grid(records: Vec<Vec<EnumCellValue>>) -> Vec<Vec<EnumCellValue>> {
    let mut grid = vec![
        text_row(&["台灣大車隊 企業會員", "", "", ""]),
        text_row(&["列帳期間：", "2024/05/01~2024/05/31", "", ""]),
        text_row(&["", "企業會員旅次明細表", "", ""]),
        text_row(&["員工編號", "員工姓名", "上車地點", "折扣後車資"]),
    ];
    grid.extend(records);
    grid.push(text_row(&["總共：", "", "", ""]));
    grid.push(text_row(&["備註", "footer", "", ""]));
    grid
}

fn build_options() -> SpecReportOptions {
    SpecReportOptions {
        date_generated: NaiveDate::from_ymd_opt(2024, 6, 5),
        ..Default::default()
    }
}

fn build_report(
    grid: &[Vec<EnumCellValue>],
    groups: &SpecEmployeeGroups,
    extensions: &ExtensionMap,
) -> SpecBillingReport {
    BillingWorkbookWriter::new(build_options())
        .write(grid, groups, extensions)
        .expect("report")
}

fn open_workbook(report: &SpecBillingReport) -> Xlsx<Cursor<Vec<u8>>> {
    Xlsx::new(Cursor::new(report.bytes.clone())).expect("xlsx")
}

fn read_sheet(report: &SpecBillingReport, sheet_name: &str) -> Range<Data> {
    open_workbook(report)
        .worksheet_range(sheet_name)
        .expect("sheet")
}

fn cell_text(range: &Range<Data>, row: usize, col: usize) -> String {
    match range.get_value((row as u32, col as u32)) {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(n)) => derive_number_text(*n),
        Some(Data::Int(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

fn row_texts(range: &Range<Data>, row: usize, n_cols: usize) -> Vec<String> {
    (0..n_cols).map(|col| cell_text(range, row, col)).collect()
}

#[test]
fn test_no_groups_yields_one_summary_row_per_employee() {
    let grid = build_vendor_grid(vec![
        trip_row("001", "Alice", "台北", 100.0),
        trip_row("002", "Bob", "新竹", 200.0),
    ]);
    let report = build_report(&grid, &SpecEmployeeGroups::default(), &ExtensionMap::new());

    let summary = read_sheet(&report, "總表");
    assert_eq!(
        row_texts(&summary, 4, 7),
        vec!["1", "Alice", "001", "", "1", "100", ""]
    );
    assert_eq!(
        row_texts(&summary, 5, 7),
        vec!["2", "Bob", "002", "", "1", "200", ""]
    );
    assert_eq!(
        row_texts(&summary, 6, 7),
        vec!["合計", "", "", "", "2", "300", ""]
    );

    assert_eq!(cell_text(&summary, 0, 0), "台灣大車隊乘車費總表");
    assert_eq!(cell_text(&summary, 0, 3), "2024/06");
    assert_eq!(cell_text(&summary, 1, 3), "2024/05/01~2024/05/31");
    assert_eq!(cell_text(&summary, 2, 3), "2024/06/05");
    assert_eq!(
        row_texts(&summary, 3, 7),
        vec!["NO", "員工姓名", "工號", "聯絡電話", "筆數", "折扣後車資", "ACK"]
    );
}

#[test]
fn test_group_collapses_members_into_one_detail_sheet() {
    let grid = build_vendor_grid(vec![
        trip_row("002", "Bob", "新竹", 200.0),
        trip_row("001", "Alice", "台北", 100.0),
    ]);
    let groups = parse_employee_groups("001,002");
    let report = build_report(&grid, &groups, &ExtensionMap::new());

    assert_eq!(report.sheet_names, vec!["總表", "001 Alice"]);
    assert_eq!(report.summary_rows.len(), 1);
    assert_eq!(report.summary_rows[0].count, 2);
    assert_eq!(report.summary_rows[0].fare_total, 300.0);

    let detail = read_sheet(&report, "001 Alice");
    assert_eq!(cell_text(&detail, 0, 0), "企業會員乘車服務電子對帳單");
    assert_eq!(cell_text(&detail, 1, 2), "友訊科技股份有限公司");
    assert_eq!(cell_text(&detail, 2, 2), "2024/05/01~2024/05/31");
    assert_eq!(
        row_texts(&detail, 3, 4),
        vec!["員工編號", "員工姓名", "上車地點", "折扣後車資"]
    );
    assert_eq!(row_texts(&detail, 4, 4), vec!["001", "Alice", "台北", "100"]);
    assert_eq!(row_texts(&detail, 5, 4), vec!["002", "Bob", "新竹", "200"]);

    assert_eq!(cell_text(&detail, 6, 0), "總筆數");
    assert_eq!(cell_text(&detail, 6, 1), "2");
    assert_eq!(cell_text(&detail, 6, 7), "300");
    assert_eq!(cell_text(&detail, 8, 6), "300元");
    assert_eq!(cell_text(&detail, 12, 0), "本期應繳帳款：");
    assert_eq!(cell_text(&detail, 12, 6), "300元");
    assert_eq!(cell_text(&detail, 13, 6), "0元");
}

#[test]
fn test_detail_sheets_follow_identifier_order() {
    let grid = build_vendor_grid(vec![
        trip_row("030", "Carol", "台中", 30.0),
        trip_row("010", "Alice", "台北", 10.0),
        trip_row("020", "Bob", "新竹", 20.0),
        trip_row("010", "Alice", "板橋", 15.0),
    ]);
    let extensions = parse_extension_map("010: 6312\n020: 6313\n030: 6314\n");
    let options = SpecReportOptions {
        source_sheet_name: Some("Sheet1".to_string()),
        ..build_options()
    };
    let report = BillingWorkbookWriter::new(options)
        .write(&grid, &SpecEmployeeGroups::default(), &extensions)
        .expect("report");

    let l_expected = vec!["Sheet1", "總表", "010 Alice", "020 Bob", "030 Carol"];
    assert_eq!(report.sheet_names, l_expected);
    assert_eq!(open_workbook(&report).sheet_names(), l_expected);
    assert!(report.diagnostics.warnings.is_empty());

    let source = read_sheet(&report, "Sheet1");
    assert_eq!(cell_text(&source, 1, 1), "2024/05/01~2024/05/31");
    assert_eq!(cell_text(&source, 4, 3), "30");

    let summary = read_sheet(&report, "總表");
    assert_eq!(
        row_texts(&summary, 4, 7),
        vec!["1", "Alice", "010", "6312", "2", "25", ""]
    );

    let detail = read_sheet(&report, "010 Alice");
    assert_eq!(cell_text(&detail, 4, 2), "台北");
    assert_eq!(cell_text(&detail, 5, 2), "板橋");
}

#[test]
fn test_totals_match_record_count_and_fare_sum() {
    let grid = build_vendor_grid(vec![
        trip_row("003", "Carol", "A", 12.5),
        trip_row("001", "Alice", "B", 7.5),
        trip_row("002", "Bob", "C", 80.0),
        trip_row("003", "Carol", "D", 20.0),
    ]);
    let groups = parse_employee_groups("003, 002\n900, 901");
    let report = build_report(&grid, &groups, &ExtensionMap::new());

    let n_count: usize = report.summary_rows.iter().map(|r| r.count).sum();
    let n_fare: f64 = report.summary_rows.iter().map(|r| r.fare_total).sum();
    assert_eq!(n_count, 4);
    assert_eq!(report.summary_total.count, 4);
    assert_eq!(n_fare, report.summary_total.fare_total);
    assert_eq!(report.summary_total.fare_total, 120.0);

    assert_eq!(
        report.summary_rows.iter().map(|r| r.seq_no).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(report.sheet_names, vec!["總表", "001 Alice", "003 Carol"]);
}

#[test]
fn test_missing_name_column_aborts_without_workbook() {
    let grid = vec![
        text_row(&["旅次明細表"]),
        text_row(&["員工編號", "折扣後車資"]),
        text_row(&["001", "100"]),
        text_row(&["總共：1"]),
    ];
    let err = generate_billing_report(&grid, &SpecEmployeeGroups::default(), &ExtensionMap::new())
        .expect_err("must fail");

    assert!(matches!(err, ReportError::MissingColumn { ref column } if column == "員工姓名"));
    assert_eq!(err.to_string(), "Required column not found: \"員工姓名\"");
}

#[test]
fn test_missing_markers_fall_back_to_full_grid() {
    let grid = vec![
        text_row(&["員工編號", "員工姓名"]),
        text_row(&["001", "Alice"]),
    ];
    let report = build_report(&grid, &SpecEmployeeGroups::default(), &ExtensionMap::new());

    assert_eq!(report.sheet_names, vec!["總表", "001 Alice"]);
    assert_eq!(report.summary_total.fare_total, 0.0);
    assert_eq!(report.diagnostics.warnings.len(), 2);
}
