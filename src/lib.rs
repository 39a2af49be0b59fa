//! # IR-Flow client
//!
//! A thin SDK for the IR-Flow incident response REST API.
//!
//! [`IrFlowClient`](client::IrFlowClient) exposes one method per endpoint:
//! alerts, fact groups, incidents, attachments, picklists and object types.
//! Each method sends one authenticated request and hands back the server's
//! JSON envelope as an [`Envelope`](models::Envelope), unmodified.
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from a mapping, an INI file or the environment
//! - [`error`] - Error types with API key sanitization
//! - [`client`] - HTTP client for the IR-Flow API
//! - [`models`] - Response envelope, field lookup and request bodies
//! - [`trace`] - Debug tracing of requests and responses
//!
//! ## Configuration
//!
//! The usual source is an INI file:
//!
//! ```ini
//! [IRFlowAPI]
//! address = irflow.example.com
//! api_user = api_user
//! api_key = 0123456789abcdef
//! protocol = https
//! debug = false
//! verbose = 1
//! ```
//!
//! ## Error handling
//!
//! Transport and configuration problems are returned as
//! [`IrFlowError`](error::IrFlowError). Failures reported by the server are
//! not errors: check [`Envelope::success`](models::Envelope::success).
//!
//! ## Example
//!
//! ```ignore
//! use irflow_client::client::IrFlowClient;
//! use irflow_client::config::Config;
//! use irflow_client::models::NewAlert;
//! use serde_json::json;
//!
//! async fn example() -> Result<(), irflow_client::error::IrFlowError> {
//!     let config = Config::from_file("api.conf")?;
//!     let client = IrFlowClient::new(&config)?;
//!
//!     let alert = NewAlert::new(json!({"Tier": "Tier1", "Risk": 3}))
//!         .with_description("Super Bad API Event")
//!         .with_field_group("ds_test");
//!     let created = client.create_alert(&alert).await?;
//!
//!     if created.success() {
//!         println!("created alert {:?}", created.pointer("/data/alert/alert_num"));
//!     } else {
//!         println!("create failed: {:?}", created.message());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod trace;

pub use crate::client::IrFlowClient;
pub use crate::config::Config;
pub use crate::error::{IrFlowError, Result};
pub use crate::models::{Envelope, Outcome};
