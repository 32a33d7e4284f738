use std::future::Future;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpTransport, OutboundRequest, TransportResponse};

type Responder =
    Box<dyn Fn(&OutboundRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// In-memory transport that answers through a closure and remembers every
/// request it saw.
pub(crate) struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&OutboundRequest) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fixed(status: u16, body: &str) -> Self {
        let body = body.to_owned();
        Self::new(move |_| Ok(TransportResponse::new(status, body.clone())))
    }

    pub(crate) fn unreachable() -> Self {
        Self::new(|request| Err(no_response(&request.url)))
    }

    pub(crate) fn requests(&self) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let reply = (self.responder)(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        reply
    }
}

pub(crate) fn no_response(url: &str) -> TransportError {
    TransportError::NoResponse {
        url: url.to_owned(),
        message: "connection refused".to_owned(),
    }
}

pub(crate) fn reply(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse::new(status, body.to_owned()))
}
