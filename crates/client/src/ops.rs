//! The remote operation surface.
//!
//! Thin pass-throughs: each method builds a [`Request`], sends it
//! through the retry-wrapped dispatcher, and unwraps the one response
//! shape the operation accepts. Any other shape is a server bug or
//! version skew and surfaces as [`Error::Protocol`].

use futures::future::BoxFuture;
use tabstore_proto::{
    Append, ColumnFamilyDescriptor, CompareOp, Delete, Get, Increment, NamespaceDescriptor, Put,
    RegionLocation, Request, Response, Row, RowMutations, Scan, TableDescriptor, TableName,
};

use crate::client::Client;
use crate::conn::{CallResult, Conn};
use crate::error::{Error, Result};

fn one_exchange(conn: &mut Conn, request: Request) -> BoxFuture<'_, CallResult<Response>> {
    Box::pin(async move { conn.call(&request).await })
}

impl Client {
    /// Dispatch one request, cloning it per attempt so the retry can
    /// resend it unchanged.
    async fn call(&self, request: Request) -> Result<Response> {
        self.execute(move |conn| one_exchange(conn, request.clone()))
            .await
    }

    // ------------------------------------------------------------------
    // Row data
    // ------------------------------------------------------------------

    /// Whether the row addressed by `get` exists.
    pub async fn exists(&self, table: impl Into<Vec<u8>>, get: Get) -> Result<bool> {
        let response = self
            .call(Request::Exists {
                table: table.into(),
                get,
            })
            .await?;
        expect_bool("exists", response)
    }

    /// Existence check for several rows, answered positionally.
    pub async fn exists_all(&self, table: impl Into<Vec<u8>>, gets: Vec<Get>) -> Result<Vec<bool>> {
        let response = self
            .call(Request::ExistsAll {
                table: table.into(),
                gets,
            })
            .await?;
        expect_bools("exists_all", response)
    }

    /// Read one row. A missing row comes back with no cells, see
    /// [`Row::is_empty`].
    pub async fn get(&self, table: impl Into<Vec<u8>>, get: Get) -> Result<Row> {
        let response = self
            .call(Request::Get {
                table: table.into(),
                get,
            })
            .await?;
        expect_row("get", response)
    }

    /// Read several rows; `None` at a position where no row matched.
    pub async fn get_multiple(
        &self,
        table: impl Into<Vec<u8>>,
        gets: Vec<Get>,
    ) -> Result<Vec<Option<Row>>> {
        let response = self
            .call(Request::GetMultiple {
                table: table.into(),
                gets,
            })
            .await?;
        expect_rows("get_multiple", response)
    }

    /// Write one row.
    pub async fn put(&self, table: impl Into<Vec<u8>>, put: Put) -> Result<()> {
        let response = self
            .call(Request::Put {
                table: table.into(),
                put,
            })
            .await?;
        expect_ack("put", response)
    }

    /// Write several rows in one round trip.
    pub async fn put_multiple(&self, table: impl Into<Vec<u8>>, puts: Vec<Put>) -> Result<()> {
        let response = self
            .call(Request::PutMultiple {
                table: table.into(),
                puts,
            })
            .await?;
        expect_ack("put_multiple", response)
    }

    /// Atomically apply `put` if the addressed column currently holds
    /// `value` (`None` checks for absence). Returns whether the put was
    /// applied.
    #[allow(clippy::too_many_arguments)]
    pub async fn check_and_put(
        &self,
        table: impl Into<Vec<u8>>,
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: Option<Vec<u8>>,
        put: Put,
    ) -> Result<bool> {
        let response = self
            .call(Request::CheckAndPut {
                table: table.into(),
                row: row.into(),
                family: family.into(),
                qualifier: qualifier.into(),
                value,
                put,
            })
            .await?;
        expect_bool("check_and_put", response)
    }

    /// Delete from one row.
    pub async fn delete(&self, table: impl Into<Vec<u8>>, delete: Delete) -> Result<()> {
        let response = self
            .call(Request::DeleteSingle {
                table: table.into(),
                delete,
            })
            .await?;
        expect_ack("delete", response)
    }

    /// Delete from several rows. The returned list holds the deletes
    /// the service could not apply; current servers always answer with
    /// an empty list.
    pub async fn delete_multiple(
        &self,
        table: impl Into<Vec<u8>>,
        deletes: Vec<Delete>,
    ) -> Result<Vec<Delete>> {
        let response = self
            .call(Request::DeleteMultiple {
                table: table.into(),
                deletes,
            })
            .await?;
        expect_deleted("delete_multiple", response)
    }

    /// Atomically apply `delete` if the addressed column currently
    /// holds `value` (`None` checks for absence).
    #[allow(clippy::too_many_arguments)]
    pub async fn check_and_delete(
        &self,
        table: impl Into<Vec<u8>>,
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: Option<Vec<u8>>,
        delete: Delete,
    ) -> Result<bool> {
        let response = self
            .call(Request::CheckAndDelete {
                table: table.into(),
                row: row.into(),
                family: family.into(),
                qualifier: qualifier.into(),
                value,
                delete,
            })
            .await?;
        expect_bool("check_and_delete", response)
    }

    /// Atomic counter bump; returns the row with the new values.
    pub async fn increment(&self, table: impl Into<Vec<u8>>, increment: Increment) -> Result<Row> {
        let response = self
            .call(Request::Increment {
                table: table.into(),
                increment,
            })
            .await?;
        expect_row("increment", response)
    }

    /// Atomic append; returns the row with the new values.
    pub async fn append(&self, table: impl Into<Vec<u8>>, append: Append) -> Result<Row> {
        let response = self
            .call(Request::Append {
                table: table.into(),
                append,
            })
            .await?;
        expect_row("append", response)
    }

    /// Apply a batch of puts and deletes to one row atomically.
    pub async fn mutate_row(
        &self,
        table: impl Into<Vec<u8>>,
        mutations: RowMutations,
    ) -> Result<()> {
        let response = self
            .call(Request::MutateRow {
                table: table.into(),
                mutations,
            })
            .await?;
        expect_ack("mutate_row", response)
    }

    /// Compare the addressed column against `value` with `compare_op`
    /// and apply `mutations` atomically when the comparison holds.
    #[allow(clippy::too_many_arguments)]
    pub async fn check_and_mutate(
        &self,
        table: impl Into<Vec<u8>>,
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        compare_op: CompareOp,
        value: Option<Vec<u8>>,
        mutations: RowMutations,
    ) -> Result<bool> {
        let response = self
            .call(Request::CheckAndMutate {
                table: table.into(),
                row: row.into(),
                family: family.into(),
                qualifier: qualifier.into(),
                compare_op,
                value,
                mutations,
            })
            .await?;
        expect_bool("check_and_mutate", response)
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    /// Open a server-side scanner and return its id.
    ///
    /// The id is bound to server-side state, not to the connection the
    /// call happened to use; pass it to [`Self::get_scanner_rows`] and
    /// close it with [`Self::close_scanner`] when done.
    pub async fn open_scanner(&self, table: impl Into<Vec<u8>>, scan: Scan) -> Result<i32> {
        let response = self
            .call(Request::OpenScanner {
                table: table.into(),
                scan,
            })
            .await?;
        expect_scanner_id("open_scanner", response)
    }

    /// Fetch the next batch from an open scanner. An empty batch means
    /// the scan is drained.
    pub async fn get_scanner_rows(&self, scanner_id: i32, num_rows: i32) -> Result<Vec<Row>> {
        let response = self
            .call(Request::GetScannerRows {
                scanner_id,
                num_rows,
            })
            .await?;
        expect_scan_batch("get_scanner_rows", response)
    }

    /// Release a scanner's server-side state.
    pub async fn close_scanner(&self, scanner_id: i32) -> Result<()> {
        let response = self.call(Request::CloseScanner { scanner_id }).await?;
        expect_ack("close_scanner", response)
    }

    /// One-shot scan: open, fetch up to `num_rows`, close, all on the
    /// server side.
    pub async fn get_scanner_results(
        &self,
        table: impl Into<Vec<u8>>,
        scan: Scan,
        num_rows: i32,
    ) -> Result<Vec<Row>> {
        let response = self
            .call(Request::GetScannerResults {
                table: table.into(),
                scan,
                num_rows,
            })
            .await?;
        expect_scan_batch("get_scanner_results", response)
    }

    // ------------------------------------------------------------------
    // Region metadata
    // ------------------------------------------------------------------

    /// Locate the region holding `row`. `reload` bypasses the server's
    /// location cache.
    pub async fn get_region_location(
        &self,
        table: impl Into<Vec<u8>>,
        row: impl Into<Vec<u8>>,
        reload: bool,
    ) -> Result<RegionLocation> {
        let response = self
            .call(Request::GetRegionLocation {
                table: table.into(),
                row: row.into(),
                reload,
            })
            .await?;
        expect_region_location("get_region_location", response)
    }

    /// All regions of a table.
    pub async fn get_all_region_locations(
        &self,
        table: impl Into<Vec<u8>>,
    ) -> Result<Vec<RegionLocation>> {
        let response = self
            .call(Request::GetAllRegionLocations {
                table: table.into(),
            })
            .await?;
        expect_region_locations("get_all_region_locations", response)
    }

    // ------------------------------------------------------------------
    // Table administration
    // ------------------------------------------------------------------

    pub async fn get_table_descriptor(&self, table: TableName) -> Result<TableDescriptor> {
        let response = self.call(Request::GetTableDescriptor { table }).await?;
        expect_table_descriptor("get_table_descriptor", response)
    }

    pub async fn get_table_descriptors(
        &self,
        tables: Vec<TableName>,
    ) -> Result<Vec<TableDescriptor>> {
        let response = self.call(Request::GetTableDescriptors { tables }).await?;
        expect_table_descriptors("get_table_descriptors", response)
    }

    pub async fn table_exists(&self, table: TableName) -> Result<bool> {
        let response = self.call(Request::TableExists { table }).await?;
        expect_bool("table_exists", response)
    }

    pub async fn get_table_descriptors_by_pattern(
        &self,
        regex: impl Into<String>,
        include_sys_tables: bool,
    ) -> Result<Vec<TableDescriptor>> {
        let response = self
            .call(Request::GetTableDescriptorsByPattern {
                regex: regex.into(),
                include_sys_tables,
            })
            .await?;
        expect_table_descriptors("get_table_descriptors_by_pattern", response)
    }

    pub async fn get_table_descriptors_by_namespace(
        &self,
        namespace: impl Into<String>,
    ) -> Result<Vec<TableDescriptor>> {
        let response = self
            .call(Request::GetTableDescriptorsByNamespace {
                namespace: namespace.into(),
            })
            .await?;
        expect_table_descriptors("get_table_descriptors_by_namespace", response)
    }

    pub async fn get_table_names_by_pattern(
        &self,
        regex: impl Into<String>,
        include_sys_tables: bool,
    ) -> Result<Vec<TableName>> {
        let response = self
            .call(Request::GetTableNamesByPattern {
                regex: regex.into(),
                include_sys_tables,
            })
            .await?;
        expect_table_names("get_table_names_by_pattern", response)
    }

    pub async fn get_table_names_by_namespace(
        &self,
        namespace: impl Into<String>,
    ) -> Result<Vec<TableName>> {
        let response = self
            .call(Request::GetTableNamesByNamespace {
                namespace: namespace.into(),
            })
            .await?;
        expect_table_names("get_table_names_by_namespace", response)
    }

    /// Create a table, pre-split at `split_keys` when non-empty.
    pub async fn create_table(
        &self,
        descriptor: TableDescriptor,
        split_keys: Vec<Vec<u8>>,
    ) -> Result<()> {
        let response = self
            .call(Request::CreateTable {
                descriptor,
                split_keys,
            })
            .await?;
        expect_ack("create_table", response)
    }

    /// Delete a table. The table must be disabled first.
    pub async fn delete_table(&self, table: TableName) -> Result<()> {
        let response = self.call(Request::DeleteTable { table }).await?;
        expect_ack("delete_table", response)
    }

    pub async fn truncate_table(&self, table: TableName, preserve_splits: bool) -> Result<()> {
        let response = self
            .call(Request::TruncateTable {
                table,
                preserve_splits,
            })
            .await?;
        expect_ack("truncate_table", response)
    }

    pub async fn enable_table(&self, table: TableName) -> Result<()> {
        let response = self.call(Request::EnableTable { table }).await?;
        expect_ack("enable_table", response)
    }

    pub async fn disable_table(&self, table: TableName) -> Result<()> {
        let response = self.call(Request::DisableTable { table }).await?;
        expect_ack("disable_table", response)
    }

    pub async fn is_table_enabled(&self, table: TableName) -> Result<bool> {
        let response = self.call(Request::IsTableEnabled { table }).await?;
        expect_bool("is_table_enabled", response)
    }

    pub async fn is_table_disabled(&self, table: TableName) -> Result<bool> {
        let response = self.call(Request::IsTableDisabled { table }).await?;
        expect_bool("is_table_disabled", response)
    }

    pub async fn is_table_available(&self, table: TableName) -> Result<bool> {
        let response = self.call(Request::IsTableAvailable { table }).await?;
        expect_bool("is_table_available", response)
    }

    pub async fn is_table_available_with_split(
        &self,
        table: TableName,
        split_keys: Vec<Vec<u8>>,
    ) -> Result<bool> {
        let response = self
            .call(Request::IsTableAvailableWithSplit { table, split_keys })
            .await?;
        expect_bool("is_table_available_with_split", response)
    }

    pub async fn add_column_family(
        &self,
        table: TableName,
        family: ColumnFamilyDescriptor,
    ) -> Result<()> {
        let response = self
            .call(Request::AddColumnFamily { table, family })
            .await?;
        expect_ack("add_column_family", response)
    }

    pub async fn delete_column_family(
        &self,
        table: TableName,
        family: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let response = self
            .call(Request::DeleteColumnFamily {
                table,
                family: family.into(),
            })
            .await?;
        expect_ack("delete_column_family", response)
    }

    pub async fn modify_column_family(
        &self,
        table: TableName,
        family: ColumnFamilyDescriptor,
    ) -> Result<()> {
        let response = self
            .call(Request::ModifyColumnFamily { table, family })
            .await?;
        expect_ack("modify_column_family", response)
    }

    pub async fn modify_table(&self, descriptor: TableDescriptor) -> Result<()> {
        let response = self.call(Request::ModifyTable { descriptor }).await?;
        expect_ack("modify_table", response)
    }

    // ------------------------------------------------------------------
    // Namespace administration
    // ------------------------------------------------------------------

    pub async fn create_namespace(&self, descriptor: NamespaceDescriptor) -> Result<()> {
        let response = self.call(Request::CreateNamespace { descriptor }).await?;
        expect_ack("create_namespace", response)
    }

    pub async fn modify_namespace(&self, descriptor: NamespaceDescriptor) -> Result<()> {
        let response = self.call(Request::ModifyNamespace { descriptor }).await?;
        expect_ack("modify_namespace", response)
    }

    /// Delete a namespace. It must not contain tables.
    pub async fn delete_namespace(&self, namespace: impl Into<String>) -> Result<()> {
        let response = self
            .call(Request::DeleteNamespace {
                namespace: namespace.into(),
            })
            .await?;
        expect_ack("delete_namespace", response)
    }

    pub async fn get_namespace_descriptor(
        &self,
        namespace: impl Into<String>,
    ) -> Result<NamespaceDescriptor> {
        let response = self
            .call(Request::GetNamespaceDescriptor {
                namespace: namespace.into(),
            })
            .await?;
        expect_namespace_descriptor("get_namespace_descriptor", response)
    }

    pub async fn list_namespace_descriptors(&self) -> Result<Vec<NamespaceDescriptor>> {
        let response = self.call(Request::ListNamespaceDescriptors).await?;
        expect_namespace_descriptors("list_namespace_descriptors", response)
    }
}

// ----------------------------------------------------------------------
// Response shape guards
// ----------------------------------------------------------------------

fn protocol(operation: &'static str, got: &Response) -> Error {
    Error::Protocol {
        operation,
        got: got.kind(),
    }
}

fn expect_ack(operation: &'static str, response: Response) -> Result<()> {
    match response {
        Response::Ack => Ok(()),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_bool(operation: &'static str, response: Response) -> Result<bool> {
    match response {
        Response::Bool(value) => Ok(value),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_bools(operation: &'static str, response: Response) -> Result<Vec<bool>> {
    match response {
        Response::Bools(values) => Ok(values),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_row(operation: &'static str, response: Response) -> Result<Row> {
    match response {
        Response::Row(row) => Ok(row),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_rows(operation: &'static str, response: Response) -> Result<Vec<Option<Row>>> {
    match response {
        Response::Rows(rows) => Ok(rows),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_scan_batch(operation: &'static str, response: Response) -> Result<Vec<Row>> {
    match response {
        Response::ScanBatch(rows) => Ok(rows),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_deleted(operation: &'static str, response: Response) -> Result<Vec<Delete>> {
    match response {
        Response::Deleted(deletes) => Ok(deletes),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_scanner_id(operation: &'static str, response: Response) -> Result<i32> {
    match response {
        Response::ScannerId(id) => Ok(id),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_region_location(operation: &'static str, response: Response) -> Result<RegionLocation> {
    match response {
        Response::RegionLocation(location) => Ok(location),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_region_locations(
    operation: &'static str,
    response: Response,
) -> Result<Vec<RegionLocation>> {
    match response {
        Response::RegionLocations(locations) => Ok(locations),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_table_descriptor(operation: &'static str, response: Response) -> Result<TableDescriptor> {
    match response {
        Response::TableDescriptor(descriptor) => Ok(descriptor),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_table_descriptors(
    operation: &'static str,
    response: Response,
) -> Result<Vec<TableDescriptor>> {
    match response {
        Response::TableDescriptors(descriptors) => Ok(descriptors),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_table_names(operation: &'static str, response: Response) -> Result<Vec<TableName>> {
    match response {
        Response::TableNames(names) => Ok(names),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_namespace_descriptor(
    operation: &'static str,
    response: Response,
) -> Result<NamespaceDescriptor> {
    match response {
        Response::NamespaceDescriptor(descriptor) => Ok(descriptor),
        other => Err(protocol(operation, &other)),
    }
}

fn expect_namespace_descriptors(
    operation: &'static str,
    response: Response,
) -> Result<Vec<NamespaceDescriptor>> {
    match response {
        Response::NamespaceDescriptors(descriptors) => Ok(descriptors),
        other => Err(protocol(operation, &other)),
    }
}
