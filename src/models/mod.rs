//! Data models for the IR-Flow API.
//!
//! This module contains the response envelope, the fact field lookup helper,
//! and the request bodies sent by [`IrFlowClient`](crate::client::IrFlowClient).

mod envelope;
mod field;
mod requests;

pub use envelope::*;
pub use field::*;
pub use requests::*;
