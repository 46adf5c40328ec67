//! Report constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecReportFormats};

/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

////////////////////////////////////////////////////////////////////////////////
// #region SentinelMarkers

/// Text contained in the row that precedes the trip table header.
pub const C_MARKER_TRIP_DETAIL: &str = "旅次明細表";
/// Prefix of the first-column text of the row that closes the trip table.
pub const C_MARKER_TOTAL: &str = "總共：";
/// Label of the row carrying the billing period in its second column.
pub const C_MARKER_BILLING_PERIOD: &str = "列帳期間：";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnPresets

/// Employee identifier column.
pub const C_COL_EMPLOYEE_ID: &str = "員工編號";
/// Employee name column.
pub const C_COL_EMPLOYEE_NAME: &str = "員工姓名";
/// Discounted fare column.
pub const C_COL_FARE: &str = "折扣後車資";
/// Pickup/drop-off location columns rendered at a fixed width.
pub const TUP_COLS_LOCATION: [&str; 2] = ["上車地點", "下車地點"];
/// Width of the fixed-width location columns.
pub const N_WIDTH_COL_LOCATION: f64 = 12.0;
/// Padding added to the longest body text of a column.
pub const N_WIDTH_PAD_BODY: usize = 4;
/// Padding added to the header text of a column.
pub const N_WIDTH_PAD_HEADER: usize = 6;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FixedLabels

/// Base font size applied to every generated cell.
pub const N_FONT_SIZE_BASE: i64 = 12;
/// Customer name printed on every detail sheet.
pub const C_CUSTOMER_NAME_DEFAULT: &str = "友訊科技股份有限公司";

/// Detail sheet title.
pub const C_DETAIL_TITLE: &str = "企業會員乘車服務電子對帳單";
/// Detail sheet customer-name label.
pub const C_LABEL_CUSTOMER: &str = "客戶名稱：";
/// Billing period label (detail and summary sheets).
pub const C_LABEL_BILLING_PERIOD: &str = "列帳期間：";

/// Summary sheet name.
pub const C_SUMMARY_SHEET_NAME: &str = "總表";
/// Summary sheet title.
pub const C_SUMMARY_TITLE: &str = "台灣大車隊乘車費總表";
/// Summary receipt-date label.
pub const C_LABEL_RECEIPT_DATE: &str = "收據日期";
/// Summary table header.
pub const TUP_SUMMARY_HEADER: [&str; 7] = [
    "NO",
    "員工姓名",
    "工號",
    "聯絡電話",
    "筆數",
    "折扣後車資",
    "ACK",
];
/// Grand-total label of the summary table.
pub const C_LABEL_GRAND_TOTAL: &str = "合計";
/// Currency suffix appended to formatted amounts.
pub const C_CURRENCY_SUFFIX: &str = "元";

/// Suffix inserted before the extension of the generated file name.
pub const C_OUTPUT_FILE_SUFFIX: &str = "_更新";
/// Key prefix of groups parsed from free text.
pub const C_GROUP_KEY_PREFIX: &str = "Group_";
/// Default sheet-name separator between identifier and name.
pub const C_SHEET_NAME_SEPARATOR: &str = " ";

// #endregion
////////////////////////////////////////////////////////////////////////////////

/// Build the named format presets used by the sheet builder.
pub fn derive_default_report_formats(font_size: i64) -> SpecReportFormats {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_size: Some(font_size),
        border: Some(1),
        ..Default::default()
    };

    SpecReportFormats {
        title: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
        bold: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
        label_right: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("right".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
        value_left: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("left".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
        center: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
        base: cfg_base_fmt_spec,
    }
}
