//! Tabular data model shared by requests and responses.
//!
//! Row keys, column families, qualifiers and values are raw byte
//! vectors, as the store imposes no encoding on them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A column coordinate: family plus optional qualifier.
///
/// Omitting the qualifier addresses the whole family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub family: Vec<u8>,
    pub qualifier: Option<Vec<u8>>,
}

impl Column {
    pub fn family(family: impl Into<Vec<u8>>) -> Self {
        Self {
            family: family.into(),
            qualifier: None,
        }
    }

    pub fn new(family: impl Into<Vec<u8>>, qualifier: impl Into<Vec<u8>>) -> Self {
        Self {
            family: family.into(),
            qualifier: Some(qualifier.into()),
        }
    }
}

/// Half-open timestamp range `[min, max)` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub min: i64,
    pub max: i64,
}

/// Write durability requested for a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Durability {
    UseDefault,
    SkipWal,
    AsyncWal,
    SyncWal,
    FsyncWal,
}

/// Read specification for a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Get {
    pub row: Vec<u8>,
    /// Columns to fetch; empty means the whole row.
    pub columns: Vec<Column>,
    pub max_versions: Option<i32>,
    pub time_range: Option<TimeRange>,
}

impl Get {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            columns: Vec::new(),
            max_versions: None,
            time_range: None,
        }
    }
}

/// One stored cell version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
    pub timestamp: i64,
}

/// A materialized row: key plus the cells matched by the read.
///
/// A read for a missing row yields a `Row` with no cells rather than
/// an absent value; check with [`Row::is_empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub key: Vec<u8>,
    pub cells: Vec<Cell>,
}

impl Row {
    #[must_use]
    pub fn empty(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            cells: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A cell to be written: like [`Cell`] but the timestamp may be left
/// to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellValue {
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
    pub timestamp: Option<i64>,
}

impl CellValue {
    pub fn new(
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            timestamp: None,
        }
    }
}

/// Row write: a set of cell values committed atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Put {
    pub row: Vec<u8>,
    pub cells: Vec<CellValue>,
    pub durability: Option<Durability>,
}

impl Put {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            cells: Vec::new(),
            durability: None,
        }
    }

    #[must_use]
    pub fn cell(mut self, cell: CellValue) -> Self {
        self.cells.push(cell);
        self
    }
}

/// Whether a delete removes one version or all versions of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteType {
    OneVersion,
    AllVersions,
}

/// Row delete specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delete {
    pub row: Vec<u8>,
    /// Columns to delete; empty means the whole row.
    pub columns: Vec<Column>,
    pub timestamp: Option<i64>,
    pub delete_type: DeleteType,
    pub durability: Option<Durability>,
}

impl Delete {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            columns: Vec::new(),
            timestamp: None,
            delete_type: DeleteType::AllVersions,
            durability: None,
        }
    }
}

/// Multi-row read specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    pub start_row: Option<Vec<u8>>,
    /// Exclusive upper bound.
    pub stop_row: Option<Vec<u8>>,
    pub columns: Vec<Column>,
    /// Rows fetched per round trip.
    pub caching: Option<i32>,
    pub max_versions: Option<i32>,
    pub batch_size: Option<i32>,
    pub time_range: Option<TimeRange>,
    pub reversed: bool,
}

/// One counter bump within an [`Increment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIncrement {
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub amount: i64,
}

/// Atomic counter increment on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Increment {
    pub row: Vec<u8>,
    pub columns: Vec<ColumnIncrement>,
    pub durability: Option<Durability>,
}

/// Atomic append to existing cell values on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Append {
    pub row: Vec<u8>,
    pub cells: Vec<CellValue>,
    pub durability: Option<Durability>,
}

/// A single mutation inside a [`RowMutations`] batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    Put(Put),
    Delete(Delete),
}

/// Puts and deletes applied atomically to one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMutations {
    pub row: Vec<u8>,
    pub mutations: Vec<Mutation>,
}

/// Comparison operator for check-and-mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
    GreaterOrEqual,
    Greater,
    NoOp,
}

/// Fully qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub namespace: String,
    pub qualifier: String,
}

impl TableName {
    pub fn new(namespace: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Table in the `default` namespace.
    pub fn default_ns(qualifier: impl Into<String>) -> Self {
        Self::new("default", qualifier)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.qualifier)
    }
}

/// Schema for one column family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamilyDescriptor {
    pub name: Vec<u8>,
    pub max_versions: Option<i32>,
    pub ttl_secs: Option<i32>,
    pub attributes: BTreeMap<String, String>,
}

impl ColumnFamilyDescriptor {
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            max_versions: None,
            ttl_secs: None,
            attributes: BTreeMap::new(),
        }
    }
}

/// Schema for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: TableName,
    pub families: Vec<ColumnFamilyDescriptor>,
    pub attributes: BTreeMap<String, String>,
}

impl TableDescriptor {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            families: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn family(mut self, family: ColumnFamilyDescriptor) -> Self {
        self.families.push(family);
        self
    }
}

/// Namespace metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDescriptor {
    pub name: String,
    pub configuration: BTreeMap<String, String>,
}

impl NamespaceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configuration: BTreeMap::new(),
        }
    }
}

/// Physical placement of a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLocation {
    pub host: String,
    pub port: u16,
    pub region_name: Vec<u8>,
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
}
