//! Row grouping: partition records by the value of a key column.

use std::collections::HashMap;

use crate::data::{Record, Scalar};

/// Records sharing one value of the key column.
///
/// `key` is `None` when the key column is absent from the rows; those rows
/// form a group of their own, separate from rows whose key is `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    pub key: Option<&'a Scalar>,
    pub records: Vec<&'a Record>,
}

impl Group<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Partition `records` into groups sharing an equal `key_column` value.
///
/// Groups come out in order of first appearance of each key, and rows keep
/// their input order inside a group. Keys are compared strictly, without
/// any normalization.
pub fn group_by<'a>(records: &'a [Record], key_column: &str) -> Vec<Group<'a>> {
    let mut slots: HashMap<Option<&'a Scalar>, usize> = HashMap::new();
    let mut groups: Vec<Group<'a>> = Vec::new();

    for record in records {
        let key = record.get(key_column);
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Group {
                key,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    tracing::debug!(
        key = key_column,
        rows = records.len(),
        groups = groups.len(),
        "grouped rows"
    );
    groups
}
