//! # Tabstore wire boundary
//!
//! Everything the client needs to talk to a tabstore endpoint: the
//! tabular data model ([`types`]), the request/response envelope and
//! credential handshake ([`message`]), length-delimited JSON framing
//! ([`codec`]), and [`Stub`] — one authenticated session bound to one
//! TCP connection.
//!
//! This crate deliberately knows nothing about pooling, retries, or
//! timeouts; those live in `tabstore-client`.

pub mod codec;
pub mod message;
pub mod stub;
pub mod types;

pub use message::{Handshake, HandshakeAck, RemoteError, RemoteErrorKind, Request, Response};
pub use stub::{Stub, StubError};
pub use types::{
    Append, Cell, CellValue, Column, ColumnFamilyDescriptor, ColumnIncrement, CompareOp, Delete,
    DeleteType, Durability, Get, Increment, Mutation, NamespaceDescriptor, Put, RegionLocation,
    Row, RowMutations, Scan, TableDescriptor, TableName, TimeRange,
};
