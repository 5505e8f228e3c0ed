//! Request/response envelope and the credential handshake.
//!
//! One frame carries exactly one JSON-encoded message. A session opens
//! with a [`Handshake`]/[`HandshakeAck`] exchange; every frame after
//! that is a [`Request`] answered by exactly one [`Response`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    Append, ColumnFamilyDescriptor, CompareOp, Delete, Get, Increment, NamespaceDescriptor, Put,
    RegionLocation, Row, RowMutations, Scan, TableDescriptor, TableName,
};

/// Credentials presented when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub access_key: String,
    pub secret_key: String,
}

/// Server verdict on a [`Handshake`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeAck {
    pub granted: bool,
    pub reason: Option<String>,
}

/// Failure category reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteErrorKind {
    /// Server-side storage or I/O problem.
    Io,
    /// The request was rejected as malformed or violating a precondition.
    IllegalArgument,
}

/// An application-level rejection from the remote service.
///
/// Opaque to the client core: it is surfaced unchanged and never
/// triggers a reconnect, since the session itself is healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("remote {kind:?} error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One remote operation. Variants map 1:1 onto the service surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    // Row data
    Exists { table: Vec<u8>, get: Get },
    ExistsAll { table: Vec<u8>, gets: Vec<Get> },
    Get { table: Vec<u8>, get: Get },
    GetMultiple { table: Vec<u8>, gets: Vec<Get> },
    Put { table: Vec<u8>, put: Put },
    PutMultiple { table: Vec<u8>, puts: Vec<Put> },
    CheckAndPut {
        table: Vec<u8>,
        row: Vec<u8>,
        family: Vec<u8>,
        qualifier: Vec<u8>,
        /// `None` checks for absence of the column.
        value: Option<Vec<u8>>,
        put: Put,
    },
    DeleteSingle { table: Vec<u8>, delete: Delete },
    DeleteMultiple { table: Vec<u8>, deletes: Vec<Delete> },
    CheckAndDelete {
        table: Vec<u8>,
        row: Vec<u8>,
        family: Vec<u8>,
        qualifier: Vec<u8>,
        value: Option<Vec<u8>>,
        delete: Delete,
    },
    Increment { table: Vec<u8>, increment: Increment },
    Append { table: Vec<u8>, append: Append },
    MutateRow { table: Vec<u8>, mutations: RowMutations },
    CheckAndMutate {
        table: Vec<u8>,
        row: Vec<u8>,
        family: Vec<u8>,
        qualifier: Vec<u8>,
        compare_op: CompareOp,
        value: Option<Vec<u8>>,
        mutations: RowMutations,
    },

    // Scanning
    OpenScanner { table: Vec<u8>, scan: Scan },
    GetScannerRows { scanner_id: i32, num_rows: i32 },
    CloseScanner { scanner_id: i32 },
    GetScannerResults { table: Vec<u8>, scan: Scan, num_rows: i32 },

    // Region metadata
    GetRegionLocation { table: Vec<u8>, row: Vec<u8>, reload: bool },
    GetAllRegionLocations { table: Vec<u8> },

    // Table administration
    GetTableDescriptor { table: TableName },
    GetTableDescriptors { tables: Vec<TableName> },
    TableExists { table: TableName },
    GetTableDescriptorsByPattern { regex: String, include_sys_tables: bool },
    GetTableDescriptorsByNamespace { namespace: String },
    GetTableNamesByPattern { regex: String, include_sys_tables: bool },
    GetTableNamesByNamespace { namespace: String },
    CreateTable { descriptor: TableDescriptor, split_keys: Vec<Vec<u8>> },
    DeleteTable { table: TableName },
    TruncateTable { table: TableName, preserve_splits: bool },
    EnableTable { table: TableName },
    DisableTable { table: TableName },
    IsTableEnabled { table: TableName },
    IsTableDisabled { table: TableName },
    IsTableAvailable { table: TableName },
    IsTableAvailableWithSplit { table: TableName, split_keys: Vec<Vec<u8>> },
    AddColumnFamily { table: TableName, family: ColumnFamilyDescriptor },
    DeleteColumnFamily { table: TableName, family: Vec<u8> },
    ModifyColumnFamily { table: TableName, family: ColumnFamilyDescriptor },
    ModifyTable { descriptor: TableDescriptor },

    // Namespace administration
    CreateNamespace { descriptor: NamespaceDescriptor },
    ModifyNamespace { descriptor: NamespaceDescriptor },
    DeleteNamespace { namespace: String },
    GetNamespaceDescriptor { namespace: String },
    ListNamespaceDescriptors,
}

/// Reply to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Success with no payload (mutations, admin operations).
    Ack,
    Bool(bool),
    Bools(Vec<bool>),
    Row(Row),
    /// Per-position results; `None` where a row was not found.
    Rows(Vec<Option<Row>>),
    /// A scanner batch; an empty batch means the scan is drained.
    ScanBatch(Vec<Row>),
    /// Deletes that could not be applied (always empty; kept for
    /// compatibility with the service surface).
    Deleted(Vec<Delete>),
    ScannerId(i32),
    RegionLocation(RegionLocation),
    RegionLocations(Vec<RegionLocation>),
    TableDescriptor(TableDescriptor),
    TableDescriptors(Vec<TableDescriptor>),
    TableNames(Vec<TableName>),
    NamespaceDescriptor(NamespaceDescriptor),
    NamespaceDescriptors(Vec<NamespaceDescriptor>),
    /// Application-level rejection; the session stays usable.
    Error(RemoteError),
}

impl Response {
    /// Variant name, for diagnostics when a reply does not match the
    /// operation that was issued.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ack => "Ack",
            Self::Bool(_) => "Bool",
            Self::Bools(_) => "Bools",
            Self::Row(_) => "Row",
            Self::Rows(_) => "Rows",
            Self::ScanBatch(_) => "ScanBatch",
            Self::Deleted(_) => "Deleted",
            Self::ScannerId(_) => "ScannerId",
            Self::RegionLocation(_) => "RegionLocation",
            Self::RegionLocations(_) => "RegionLocations",
            Self::TableDescriptor(_) => "TableDescriptor",
            Self::TableDescriptors(_) => "TableDescriptors",
            Self::TableNames(_) => "TableNames",
            Self::NamespaceDescriptor(_) => "NamespaceDescriptor",
            Self::NamespaceDescriptors(_) => "NamespaceDescriptors",
            Self::Error(_) => "Error",
        }
    }
}
