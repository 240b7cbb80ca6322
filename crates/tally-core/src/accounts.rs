//! Partitioning of a table by account

use std::collections::HashMap;

use tally_parser::{TransactionRecord, TransactionTable};

/// Per-account tables, keyed in order of first appearance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountTables {
    entries: Vec<(String, TransactionTable)>,
}

impl AccountTables {
    /// Table of one account
    pub fn get(&self, account: &str) -> Option<&TransactionTable> {
        self.entries
            .iter()
            .find(|(name, _)| name == account)
            .map(|(_, table)| table)
    }

    pub fn contains(&self, account: &str) -> bool {
        self.get(account).is_some()
    }

    /// Account names in order of first appearance
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransactionTable)> {
        self.entries.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Group records by exact account name, keeping each account's rows in
/// their original relative order
pub fn partition(table: &[TransactionRecord]) -> AccountTables {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(String, TransactionTable)> = Vec::new();

    for record in table {
        let slot = *index.entry(record.account.as_str()).or_insert_with(|| {
            entries.push((record.account.clone(), Vec::new()));
            entries.len() - 1
        });
        entries[slot].1.push(record.clone());
    }

    log::debug!("Partitioned {} rows into {} accounts", table.len(), entries.len());
    AccountTables { entries }
}
