//! Distributed mode
//!
//! A coordinator process serves range leases over HTTP; worker processes on
//! any number of hosts request ranges, test them and post results back.
//!
//! # Architecture
//!
//! - **Server**: axum router wrapping one in-process `Coordinator`
//! - **Client**: reqwest-based `WorkSource` used by remote range workers
//! - **Protocol**: JSON message types shared by both sides
//!
//! The coordinator never calls out to workers. All traffic is worker-initiated
//! request/response, so workers may come and go freely.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::HttpCoordinatorClient;
pub use protocol::{
    DivisorsResponse, ErrorResponse, RangeReport, SubmitAck, WorkAssignment, WorkQuery, WorkerId,
};
pub use server::{router, serve};
