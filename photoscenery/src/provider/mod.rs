//! Map server access.
//!
//! [`MapServer`] describes a WMS-style endpoint and turns a bounding box into
//! a request URL. [`AsyncHttpClient`] is the seam the fetch pipeline
//! downloads through, with [`AsyncReqwestClient`] as the production client.

mod http;
mod server;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, ClientOptions, DEFAULT_TIMEOUT};
pub use server::{CellRequest, MapServer, TemplateError, LOSSY_WIDTH_THRESHOLD};
pub use types::{ProviderError, SERVICE_UNAVAILABLE};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
