//! In-process mock endpoint for client tests.
//!
//! Speaks the real wire protocol over loopback TCP. Behavior per
//! request is pluggable; dials are counted so tests can observe
//! reconnects.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tabstore_client::Options;
use tabstore_client::proto::{
    Handshake, HandshakeAck, NamespaceDescriptor, RegionLocation, Request, Response, Row,
    TableDescriptor, codec,
};
use tokio::net::{TcpListener, TcpStream};

/// What the mock does with one request.
pub enum Reply {
    Respond(Response),
    /// Drop the connection without answering.
    Hangup,
    /// Never answer; the connection stays open until the client gives
    /// up.
    Stall,
}

type Handler = dyn Fn(Request) -> Reply + Send + Sync;

pub struct MockServer {
    addr: SocketAddr,
    dials: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
    accept_loop: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Bind on an ephemeral loopback port and serve `handler`.
    pub async fn start(handler: impl Fn(Request) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let dials = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(AtomicUsize::new(0));
        let handler: Arc<Handler> = Arc::new(handler);

        let accept_loop = tokio::spawn({
            let dials = Arc::clone(&dials);
            let requests = Arc::clone(&requests);
            async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    dials.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve_session(
                        stream,
                        Arc::clone(&handler),
                        Arc::clone(&requests),
                    ));
                }
            }
        });

        Self {
            addr,
            dials,
            requests,
            accept_loop,
        }
    }

    /// A server that answers every request with a plausible success.
    pub async fn canned() -> Self {
        Self::start(|request| Reply::Respond(canned_response(request))).await
    }

    /// Client options pointing at this server, tuned for fast tests:
    /// one connection, short timeouts. Tests that need more override.
    pub fn options(&self) -> Options {
        Options::new()
            .addr(self.addr.to_string())
            .credentials("ak", "sk")
            .max_connections(1)
            .connect_timeout(Duration::from_secs(1))
            .acquire_timeout(Duration::from_secs(1))
            .retry_interval(Duration::from_millis(10))
    }

    /// Completed handshakes so far; grows by one per (re)connect.
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Requests received so far, across all sessions.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve_session(stream: TcpStream, handler: Arc<Handler>, requests: Arc<AtomicUsize>) {
    let mut framed = codec::framed(stream);

    let Some(Ok(frame)) = framed.next().await else {
        return;
    };
    let Ok(hello) = codec::decode::<Handshake>(&frame) else {
        return;
    };
    // "deny" as access key simulates bad credentials.
    let granted = hello.access_key != "deny";
    let ack = HandshakeAck {
        granted,
        reason: (!granted).then(|| "access denied".to_owned()),
    };
    if framed.send(codec::encode(&ack).unwrap()).await.is_err() || !granted {
        return;
    }

    while let Some(Ok(frame)) = framed.next().await {
        let Ok(request) = codec::decode::<Request>(&frame) else {
            return;
        };
        requests.fetch_add(1, Ordering::SeqCst);
        match handler(request) {
            Reply::Respond(response) => {
                if framed
                    .send(codec::encode(&response).unwrap())
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Reply::Hangup => return,
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                return;
            }
        }
    }
}

pub fn sample_region() -> RegionLocation {
    RegionLocation {
        host: "region-1.internal".to_owned(),
        port: 16020,
        region_name: b"r1".to_vec(),
        start_key: Vec::new(),
        end_key: Vec::new(),
    }
}

/// Minimal well-shaped success for every operation.
pub fn canned_response(request: Request) -> Response {
    match request {
        Request::Exists { .. }
        | Request::CheckAndPut { .. }
        | Request::CheckAndDelete { .. }
        | Request::CheckAndMutate { .. }
        | Request::TableExists { .. }
        | Request::IsTableEnabled { .. }
        | Request::IsTableDisabled { .. }
        | Request::IsTableAvailable { .. }
        | Request::IsTableAvailableWithSplit { .. } => Response::Bool(true),

        Request::ExistsAll { gets, .. } => Response::Bools(vec![true; gets.len()]),
        Request::Get { get, .. } => Response::Row(Row::empty(get.row)),
        Request::GetMultiple { gets, .. } => {
            Response::Rows(gets.into_iter().map(|get| Some(Row::empty(get.row))).collect())
        }
        Request::Increment { increment, .. } => Response::Row(Row::empty(increment.row)),
        Request::Append { append, .. } => Response::Row(Row::empty(append.row)),
        Request::DeleteMultiple { .. } => Response::Deleted(Vec::new()),

        Request::OpenScanner { .. } => Response::ScannerId(1),
        Request::GetScannerRows { .. } | Request::GetScannerResults { .. } => {
            Response::ScanBatch(Vec::new())
        }

        Request::GetRegionLocation { .. } => Response::RegionLocation(sample_region()),
        Request::GetAllRegionLocations { .. } => Response::RegionLocations(vec![sample_region()]),

        Request::GetTableDescriptor { table } => {
            Response::TableDescriptor(TableDescriptor::new(table))
        }
        Request::GetTableDescriptors { tables } => {
            Response::TableDescriptors(tables.into_iter().map(TableDescriptor::new).collect())
        }
        Request::GetTableDescriptorsByPattern { .. }
        | Request::GetTableDescriptorsByNamespace { .. } => Response::TableDescriptors(Vec::new()),
        Request::GetTableNamesByPattern { .. } | Request::GetTableNamesByNamespace { .. } => {
            Response::TableNames(Vec::new())
        }

        Request::GetNamespaceDescriptor { namespace } => {
            Response::NamespaceDescriptor(NamespaceDescriptor::new(namespace))
        }
        Request::ListNamespaceDescriptors => Response::NamespaceDescriptors(Vec::new()),

        Request::Put { .. }
        | Request::PutMultiple { .. }
        | Request::DeleteSingle { .. }
        | Request::MutateRow { .. }
        | Request::CloseScanner { .. }
        | Request::CreateTable { .. }
        | Request::DeleteTable { .. }
        | Request::TruncateTable { .. }
        | Request::EnableTable { .. }
        | Request::DisableTable { .. }
        | Request::AddColumnFamily { .. }
        | Request::DeleteColumnFamily { .. }
        | Request::ModifyColumnFamily { .. }
        | Request::ModifyTable { .. }
        | Request::CreateNamespace { .. }
        | Request::ModifyNamespace { .. }
        | Request::DeleteNamespace { .. } => Response::Ack,
    }
}
