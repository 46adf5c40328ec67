//! Per-partition counts, fare totals and summary ordering.
//!
//! Detail record order differs by partition kind: group partitions list
//! records sorted by employee identifier, singletons keep table order.

use tracing::debug;

use crate::group::derive_record_employee_id;
use crate::spec::{
    EnumPartitionKind, ExtensionMap, SpecKeyColumns, SpecPartition, SpecPartitionAggregate,
    SpecSummaryRow, SpecSummaryTotal, SpecTripTable,
};
use crate::util::parse_cell_number;

/// Sum of the fare column over `record_indices`; zero when the column is absent.
pub fn calculate_fare_total(
    table: &SpecTripTable,
    columns: &SpecKeyColumns,
    record_indices: &[usize],
) -> f64 {
    let Some(idx_fare) = columns.idx_fare else {
        return 0.0;
    };
    record_indices
        .iter()
        .filter_map(|idx| parse_cell_number(&table.records[*idx][idx_fare]))
        .sum()
}

/// Aggregate one partition into its summary row and detail record order.
pub fn aggregate_partition(
    table: &SpecTripTable,
    columns: &SpecKeyColumns,
    partition: SpecPartition,
    extensions: &ExtensionMap,
) -> SpecPartitionAggregate {
    let mut record_indices_ordered = partition.record_indices.clone();
    if matches!(partition.kind, EnumPartitionKind::Group(_)) {
        record_indices_ordered.sort_by_key(|idx| derive_record_employee_id(table, columns, *idx));
    }

    let summary = SpecSummaryRow {
        seq_no: 0,
        name: partition.representative_name.clone(),
        employee_id: partition.representative_id.clone(),
        extension: extensions
            .get(&partition.representative_id)
            .cloned()
            .unwrap_or_default(),
        count: partition.record_indices.len(),
        fare_total: calculate_fare_total(table, columns, &partition.record_indices),
        ack: String::new(),
    };

    SpecPartitionAggregate {
        partition,
        summary,
        record_indices_ordered,
    }
}

/// Aggregate every partition, preserving partition order.
pub fn aggregate_partitions(
    table: &SpecTripTable,
    columns: &SpecKeyColumns,
    partitions: Vec<SpecPartition>,
    extensions: &ExtensionMap,
) -> Vec<SpecPartitionAggregate> {
    partitions
        .into_iter()
        .map(|partition| aggregate_partition(table, columns, partition, extensions))
        .collect()
}

/// Sort summary rows by representative identifier, number them `1..=N`, and total them.
pub fn finalize_summary_rows(
    aggregates: &[SpecPartitionAggregate],
) -> (Vec<SpecSummaryRow>, SpecSummaryTotal) {
    let mut l_rows: Vec<SpecSummaryRow> =
        aggregates.iter().map(|agg| agg.summary.clone()).collect();
    l_rows.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));

    let mut total = SpecSummaryTotal::default();
    for (idx, row) in l_rows.iter_mut().enumerate() {
        row.seq_no = idx + 1;
        total.count += row.count;
        total.fare_total += row.fare_total;
    }

    debug!(
        n_rows = l_rows.len(),
        count = total.count,
        fare_total = total.fare_total,
        "finalized summary rows"
    );
    (l_rows, total)
}
