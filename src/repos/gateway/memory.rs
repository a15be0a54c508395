//! Process-local tables, used when no spreadsheet is configured
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use failure::Fail;

use models::Row;
use repos::error::Error as RepoError;
use repos::gateway::PersistenceGateway;
use repos::types::RepoResult;

#[derive(Clone, Default)]
pub struct InMemoryGateway {
    tables: Arc<Mutex<HashMap<String, Vec<Row>>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway with a prefilled table
    pub fn with_rows(table: &str, rows: Vec<Row>) -> Self {
        let gateway = Self::default();
        gateway.tables.lock().unwrap().insert(table.to_string(), rows);
        gateway
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn read_all(&self, table: &str) -> RepoResult<Vec<Row>> {
        debug!("Read all rows of table {}.", table);
        let tables = self.tables.lock().unwrap();
        Ok(tables.get(table).cloned().unwrap_or_default())
    }

    fn append(&self, table: &str, row: Row) -> RepoResult<()> {
        debug!("Append row {:?} to table {}.", row, table);
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_insert_with(Vec::new).push(row);
        Ok(())
    }

    fn update(&self, table: &str, row_index: usize, row: Row) -> RepoResult<()> {
        debug!("Update row {} of table {} with {:?}.", row_index, table, row);
        let mut tables = self.tables.lock().unwrap();
        match tables.get_mut(table).and_then(|rows| rows.get_mut(row_index)) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(RepoError::NotFound
                .context(format!("Update row {} of table {} error occurred", row_index, table))
                .into()),
        }
    }
}
