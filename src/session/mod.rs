//! Session layer
//!
//! - **Transport**: one HTTP attempt per request (`reqwest`)
//! - **Gateway**: bearer-token attachment and 401 teardown

mod gateway;
mod transport;

pub use gateway::{Session, SessionGateway, TeardownHook};
pub use transport::{
    ApiRequest, ApiResponse, FilePart, HttpTransport, Method, RequestBody, Transport,
    TransportError,
};

#[cfg(test)]
pub(crate) use gateway::test_support;
