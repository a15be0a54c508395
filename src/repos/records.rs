//! Append-only tables: bookings, payments and subscriptions
use failure::Error as FailureError;

use config::Tables;
use models::Row;
use repos::gateway::PersistenceGateway;
use repos::types::RepoResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    Bookings,
    Payments,
    Subscriptions,
}

impl Table {
    pub fn name(self, tables: &Tables) -> &str {
        match self {
            Table::Bookings => &tables.bookings,
            Table::Payments => &tables.payments,
            Table::Subscriptions => &tables.subscriptions,
        }
    }
}

pub trait RecordsRepo {
    /// Appends a record row
    fn append(&self, table: Table, row: Row) -> RepoResult<()>;

    /// List all record rows
    fn list(&self, table: Table) -> RepoResult<Vec<Row>>;
}

pub struct RecordsRepoImpl<'a> {
    pub gateway: &'a PersistenceGateway,
    pub tables: Tables,
}

impl<'a> RecordsRepoImpl<'a> {
    pub fn new(gateway: &'a PersistenceGateway, tables: Tables) -> Self {
        Self { gateway, tables }
    }
}

impl<'a> RecordsRepo for RecordsRepoImpl<'a> {
    fn append(&self, table: Table, row: Row) -> RepoResult<()> {
        let name = table.name(&self.tables);
        debug!("Append {:?} record {:?} to table {}.", table, row, name);
        self.gateway
            .append(name, row)
            .map_err(|e: FailureError| e.context(format!("Append {:?} record error occurred", table)).into())
    }

    fn list(&self, table: Table) -> RepoResult<Vec<Row>> {
        let name = table.name(&self.tables);
        debug!("Find all {:?} records in table {}.", table, name);
        self.gateway
            .read_all(name)
            .map_err(|e: FailureError| e.context(format!("List all {:?} records", table)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::row_from;
    use repos::gateway::InMemoryGateway;

    #[test]
    fn records_land_in_configured_tables() {
        let gateway = InMemoryGateway::new();
        let tables = Tables {
            bookings: "Bookings".to_string(),
            payments: "Payments".to_string(),
            subscriptions: "Subscriptions".to_string(),
            coupons: "Payments".to_string(),
        };
        let repo = RecordsRepoImpl::new(&gateway, tables);

        repo.append(Table::Bookings, row_from(vec![("id", "BK-1")])).unwrap();

        assert_eq!(repo.list(Table::Bookings).unwrap().len(), 1);
        assert_eq!(gateway.read_all("Bookings").unwrap()[0]["id"], "BK-1");
        assert!(repo.list(Table::Payments).unwrap().is_empty());
    }
}
