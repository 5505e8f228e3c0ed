//! One authenticated session to a tabstore endpoint.
//!
//! A [`Stub`] owns a framed TCP stream and exposes a strict
//! request/response call surface. It is used by exactly one caller at
//! a time; concurrency and reuse are the pool's business, not ours.

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::codec;
use crate::message::{Handshake, HandshakeAck, Request, Response};

/// Transport-layer failure on a session.
///
/// Every variant here means the session itself is suspect; an
/// application-level rejection arrives as [`Response::Error`] instead.
#[derive(Debug, Error)]
pub enum StubError {
    #[error("session i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("session is closed")]
    Closed,
    #[error("handshake rejected: {0}")]
    Rejected(String),
}

/// One network session plus the call surface bound to it.
#[derive(Debug)]
pub struct Stub {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    open: bool,
}

impl Stub {
    /// Dial `addr` and authenticate.
    ///
    /// # Errors
    /// Fails on dial failure, on a torn or malformed handshake, or when
    /// the server refuses the credentials ([`StubError::Rejected`]).
    pub async fn connect(addr: &str, hello: &Handshake) -> Result<Self, StubError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let mut framed = codec::framed(stream);

        framed.send(codec::encode(hello)?).await?;
        let frame = framed.next().await.ok_or(StubError::Closed)??;
        let ack: HandshakeAck = codec::decode(&frame)?;
        if !ack.granted {
            return Err(StubError::Rejected(
                ack.reason.unwrap_or_else(|| "credentials refused".to_owned()),
            ));
        }

        Ok(Self { framed, open: true })
    }

    /// Best-effort liveness hint.
    ///
    /// `true` only says the session has not yet observed a failure;
    /// the next call can still fail.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Issue one request and wait for its response.
    ///
    /// Any transport failure marks the session closed; the caller is
    /// expected to discard the stub afterwards.
    pub async fn call(&mut self, request: &Request) -> Result<Response, StubError> {
        if !self.open {
            return Err(StubError::Closed);
        }
        let result = self.roundtrip(request).await;
        if result.is_err() {
            self.open = false;
        }
        result
    }

    async fn roundtrip(&mut self, request: &Request) -> Result<Response, StubError> {
        self.framed.send(codec::encode(request)?).await?;
        let frame = self.framed.next().await.ok_or(StubError::Closed)??;
        Ok(codec::decode(&frame)?)
    }

    /// Shut the session down. Idempotent.
    pub async fn close(&mut self) -> Result<(), std::io::Error> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.framed.get_mut().shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RemoteError, RemoteErrorKind};
    use tokio::net::TcpListener;

    /// Minimal peer: accept one connection, grant or refuse the
    /// handshake, then answer every request with a canned response.
    async fn one_shot_server(grant: bool, reply: Response) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = codec::framed(stream);
            let frame = framed.next().await.unwrap().unwrap();
            let _hello: Handshake = codec::decode(&frame).unwrap();
            let ack = HandshakeAck {
                granted: grant,
                reason: (!grant).then(|| "bad key".to_owned()),
            };
            framed.send(codec::encode(&ack).unwrap()).await.unwrap();
            while let Some(Ok(frame)) = framed.next().await {
                let _req: Request = codec::decode(&frame).unwrap();
                framed.send(codec::encode(&reply).unwrap()).await.unwrap();
            }
        });
        addr
    }

    fn hello() -> Handshake {
        Handshake {
            access_key: "ak".to_owned(),
            secret_key: "sk".to_owned(),
        }
    }

    #[tokio::test]
    async fn call_roundtrip() {
        let addr = one_shot_server(true, Response::Bool(true)).await;
        let mut stub = Stub::connect(&addr, &hello()).await.unwrap();
        assert!(stub.is_open());

        let resp = stub
            .call(&Request::ListNamespaceDescriptors)
            .await
            .unwrap();
        assert_eq!(resp, Response::Bool(true));
    }

    #[tokio::test]
    async fn refused_handshake_is_rejected() {
        let addr = one_shot_server(false, Response::Ack).await;
        match Stub::connect(&addr, &hello()).await {
            Err(StubError::Rejected(reason)) => assert_eq!(reason, "bad key"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_error_is_a_normal_response() {
        let reply = Response::Error(RemoteError::new(RemoteErrorKind::Io, "region offline"));
        let addr = one_shot_server(true, reply.clone()).await;
        let mut stub = Stub::connect(&addr, &hello()).await.unwrap();

        let resp = stub.call(&Request::ListNamespaceDescriptors).await.unwrap();
        assert_eq!(resp, reply);
        // The session is still healthy after an application-level error.
        assert!(stub.is_open());
    }

    #[tokio::test]
    async fn call_after_close_fails_fast() {
        let addr = one_shot_server(true, Response::Ack).await;
        let mut stub = Stub::connect(&addr, &hello()).await.unwrap();
        stub.close().await.unwrap();
        stub.close().await.unwrap(); // idempotent

        assert!(!stub.is_open());
        match stub.call(&Request::ListNamespaceDescriptors).await {
            Err(StubError::Closed) => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn peer_hangup_marks_session_dead() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = codec::framed(stream);
            let _ = framed.next().await;
            let ack = HandshakeAck {
                granted: true,
                reason: None,
            };
            framed.send(codec::encode(&ack).unwrap()).await.unwrap();
            // Drop the connection without answering the first request.
            let _ = framed.next().await;
        });

        let mut stub = Stub::connect(&addr, &hello()).await.unwrap();
        let err = stub
            .call(&Request::ListNamespaceDescriptors)
            .await
            .unwrap_err();
        assert!(matches!(err, StubError::Closed | StubError::Io(_)));
        assert!(!stub.is_open());
    }
}
