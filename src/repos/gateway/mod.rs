//! Persistence gateway is the boundary to the durable store: a set of named
//! tables made of rows keyed by column header.
pub mod memory;
pub mod sheets;

pub use self::memory::*;
pub use self::sheets::*;

use models::Row;
use repos::types::RepoResult;

pub trait PersistenceGateway: Send + Sync {
    /// Reads every data row of a table, in storage order
    fn read_all(&self, table: &str) -> RepoResult<Vec<Row>>;

    /// Appends a row at the end of a table
    fn append(&self, table: &str, row: Row) -> RepoResult<()>;

    /// Replaces the row at `row_index`, the position of the row in `read_all`
    fn update(&self, table: &str, row_index: usize, row: Row) -> RepoResult<()>;
}
