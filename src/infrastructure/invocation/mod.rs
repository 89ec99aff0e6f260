//! Outbound worker invocation

mod pipeline;
mod transport;

pub use pipeline::InvocationPipeline;
pub use transport::{OutboundRequest, ReqwestWorkerTransport, WorkerResponse, WorkerTransport};

#[cfg(test)]
pub use transport::MockWorkerTransport;
