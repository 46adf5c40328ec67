//! Grouping resolver: partition trip records into explicit groups and singletons.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::spec::{
    EnumPartitionKind, ReportError, SpecEmployeeGroups, SpecKeyColumns, SpecPartition,
    SpecReportDiagnostics, SpecReportOptions, SpecTripTable,
};
use crate::util::derive_cell_text;

/// Resolve the load-bearing column indices; identifier and name are required.
pub fn resolve_key_columns(
    table: &SpecTripTable,
    options: &SpecReportOptions,
) -> Result<SpecKeyColumns, ReportError> {
    let find_required = |column: &str| {
        table
            .position(column)
            .ok_or_else(|| ReportError::MissingColumn {
                column: column.to_string(),
            })
    };

    Ok(SpecKeyColumns {
        idx_employee_id: find_required(&options.col_employee_id)?,
        idx_employee_name: find_required(&options.col_employee_name)?,
        idx_fare: table.position(&options.col_fare),
    })
}

/// Employee identifier of one record, as text.
pub fn derive_record_employee_id(
    table: &SpecTripTable,
    columns: &SpecKeyColumns,
    idx_record: usize,
) -> String {
    derive_cell_text(&table.records[idx_record][columns.idx_employee_id])
}

/// Sorted distinct employee identifiers present in `table`.
pub fn list_employee_ids(table: &SpecTripTable, columns: &SpecKeyColumns) -> Vec<String> {
    (0..table.height())
        .map(|idx| derive_record_employee_id(table, columns, idx))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Partition every record of `table` into exactly one reporting unit.
///
/// Groups are resolved first, in declaration order; a group whose members
/// have no records is dropped. The representative is the first declared
/// member that has records. An identifier declared by several groups stays
/// with the first one. Remaining identifiers become singletons in
/// first-appearance order.
pub fn resolve_partitions(
    table: &SpecTripTable,
    columns: &SpecKeyColumns,
    groups: &SpecEmployeeGroups,
    diagnostics: &mut SpecReportDiagnostics,
) -> Vec<SpecPartition> {
    let mut l_ids_ordered: Vec<String> = Vec::new();
    let mut dict_records_by_id: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for idx_record in 0..table.height() {
        let c_id = derive_record_employee_id(table, columns, idx_record);
        let l_records = dict_records_by_id.entry(c_id.clone()).or_default();
        if l_records.is_empty() {
            l_ids_ordered.push(c_id);
        }
        l_records.push(idx_record);
    }

    let mut l_partitions = Vec::new();
    let mut set_ids_claimed: BTreeSet<String> = BTreeSet::new();

    for group in &groups.groups {
        let mut l_members: Vec<String> = Vec::new();
        for c_member in &group.members {
            if l_members.contains(c_member) {
                continue;
            }
            if set_ids_claimed.contains(c_member) {
                diagnostics.warn(format!(
                    "Employee {c_member:?} already belongs to an earlier group; \
                     ignored in group {:?}.",
                    group.key
                ));
                continue;
            }
            l_members.push(c_member.clone());
        }
        set_ids_claimed.extend(l_members.iter().cloned());

        let l_members_present: Vec<String> = l_members
            .iter()
            .filter(|c_member| dict_records_by_id.contains_key(*c_member))
            .cloned()
            .collect();
        let Some(c_representative_id) = l_members_present.first() else {
            debug!(group = %group.key, "group has no records; dropped");
            continue;
        };
        if l_members.first() != Some(c_representative_id) {
            diagnostics.warn(format!(
                "Group {:?}: first declared member {:?} has no records; {:?} represents the group.",
                group.key,
                l_members.first().map(String::as_str).unwrap_or_default(),
                c_representative_id
            ));
        }

        let mut l_record_indices: Vec<usize> = l_members_present
            .iter()
            .flat_map(|c_member| dict_records_by_id[c_member].iter().copied())
            .collect();
        l_record_indices.sort_unstable();

        let c_representative_name = derive_cell_text(
            &table.records[dict_records_by_id[c_representative_id][0]][columns.idx_employee_name],
        );

        debug!(
            group = %group.key,
            representative = %c_representative_id,
            n_members = l_members_present.len(),
            n_records = l_record_indices.len(),
            "resolved group partition"
        );

        l_partitions.push(SpecPartition {
            kind: EnumPartitionKind::Group(group.key.clone()),
            representative_id: c_representative_id.clone(),
            representative_name: c_representative_name,
            member_ids: l_members_present,
            record_indices: l_record_indices,
        });
    }

    for c_id in l_ids_ordered {
        if set_ids_claimed.contains(&c_id) {
            continue;
        }
        let l_record_indices = dict_records_by_id.remove(&c_id).unwrap_or_default();
        let c_name = l_record_indices
            .first()
            .map(|idx| derive_cell_text(&table.records[*idx][columns.idx_employee_name]))
            .unwrap_or_default();
        l_partitions.push(SpecPartition {
            kind: EnumPartitionKind::Singleton,
            representative_id: c_id.clone(),
            representative_name: c_name,
            member_ids: vec![c_id],
            record_indices: l_record_indices,
        });
    }

    l_partitions
}
