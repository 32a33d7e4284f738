//! Endpoint descriptors, request composition and execution.
mod builders;
mod client;
mod endpoint;
mod method;
mod sender;
mod transport;


pub(crate) use builders::join_url;
pub use client::ExecutionClient;
pub use endpoint::{EndpointBuilder, EndpointDescriptor};
pub use method::HttpMethod;
pub use sender::{DEFAULT_USER_AGENT, ReqwestTransport};
pub use transport::{HttpTransport, OutboundRequest, TransportResponse};
