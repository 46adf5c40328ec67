//! # farekit
//!
//! Command-line front end for the ride-billing report engine.

mod loader;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use farekit_report::{
    BillingWorkbookWriter, ExtensionMap, SpecEmployeeGroups, SpecReportOptions,
    derive_output_file_name, parse_employee_groups, parse_extension_map,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::loader::{list_sheet_names, load_raw_grid};

/// farekit - build a billing workbook from a ride-billing export
#[derive(Parser)]
#[command(name = "farekit")]
#[command(author, version, about = "Ride-billing workbook generator", long_about = None)]
struct Cli {
    /// Vendor export (.xlsx, .xls, .ods) or Arrow IPC file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Sheet to read; defaults to the first sheet
    #[arg(short, long)]
    sheet: Option<String>,

    /// Extension mapping file, one `id: extension` per line
    #[arg(short = 'x', long, value_name = "FILE")]
    extensions: Option<PathBuf>,

    /// Employee group file, one comma-separated group per line
    #[arg(short, long, value_name = "FILE")]
    groups: Option<PathBuf>,

    /// Output workbook; defaults to `<input stem>_更新.xlsx` next to the input
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Customer name printed on detail sheets
    #[arg(long)]
    customer_name: Option<String>,

    /// List the sheets of INPUT and exit
    #[arg(long)]
    list_sheets: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let c_level_default = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_level_default)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.list_sheets {
        for c_name in list_sheet_names(&cli.input)? {
            println!("{c_name}");
        }
        return Ok(());
    }

    let loaded = load_raw_grid(&cli.input, cli.sheet.as_deref())?;
    info!(sheet = %loaded.sheet_name, n_rows = loaded.grid.len(), "input loaded");

    let extensions = match &cli.extensions {
        Some(path) => parse_extension_map(&read_text(path)?),
        None => ExtensionMap::new(),
    };
    let groups = match &cli.groups {
        Some(path) => parse_employee_groups(&read_text(path)?),
        None => SpecEmployeeGroups::default(),
    };

    let mut options = SpecReportOptions {
        source_sheet_name: Some(loaded.sheet_name.clone()),
        ..Default::default()
    };
    if let Some(c_customer) = cli.customer_name {
        options.customer_name = c_customer;
    }

    let report = BillingWorkbookWriter::new(options)
        .write(&loaded.grid, &groups, &extensions)
        .with_context(|| format!("Failed to build billing workbook from {}", cli.input.display()))?;

    let path_out = cli
        .output
        .unwrap_or_else(|| derive_default_output_path(&cli.input));
    fs::write(&path_out, &report.bytes)
        .with_context(|| format!("Failed to write {}", path_out.display()))?;

    println!(
        "Wrote {} ({} sheets, {} records, fare total {})",
        path_out.display(),
        report.sheet_names.len(),
        report.summary_total.count,
        report.summary_total.fare_total
    );
    if !report.diagnostics.warnings.is_empty() {
        eprintln!("{} warning(s):", report.diagnostics.warnings.len());
        for c_msg in &report.diagnostics.warnings {
            eprintln!("  - {c_msg}");
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn derive_default_output_path(input: &Path) -> PathBuf {
    let c_file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(derive_output_file_name(&c_file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_default_output_path_sits_next_to_input() {
        assert_eq!(
            derive_default_output_path(Path::new("/data/trips.xlsx")),
            PathBuf::from("/data/trips_更新.xlsx")
        );
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "farekit",
            "trips.xlsx",
            "--sheet",
            "明細",
            "-x",
            "ext.txt",
            "--groups",
            "groups.txt",
            "--customer-name",
            "ACME",
            "-v",
        ])
        .expect("cli");

        assert_eq!(cli.input, PathBuf::from("trips.xlsx"));
        assert_eq!(cli.sheet.as_deref(), Some("明細"));
        assert_eq!(cli.extensions, Some(PathBuf::from("ext.txt")));
        assert_eq!(cli.groups, Some(PathBuf::from("groups.txt")));
        assert_eq!(cli.customer_name.as_deref(), Some("ACME"));
        assert!(cli.verbose);
        assert!(!cli.list_sheets);
    }
}
