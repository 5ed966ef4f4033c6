//! Core library for the pulse survey manager report exporter.
//!
//! This crate provides the building blocks used by the `pulse-survey-export`
//! binary: environment-driven configuration, RSA key-pair credential
//! resolution, a key-pair-authenticated Snowflake SQL API session, and the
//! per-manager CSV report partitioner.
//!
//! # Security Guarantees
//! - Private key material is held in zeroizing buffers and never logged
//! - Authentication uses key-pair JWTs; no password is ever transmitted
//! - Error messages never include key material or tokens
//!
//! # Architecture
//! The pipeline is strictly sequential: resolve credentials, open one
//! session, run one fixed query, partition the result by manager, write one
//! CSV per partition. Every failure propagates to the process boundary;
//! there is no retry and no partial-success recovery.

pub mod config;
pub mod error;
pub mod keypair;
pub mod logging;
pub mod report;
pub mod snowflake;
pub mod table;

// Re-export commonly used types
pub use config::Config;
pub use error::{PulseSurveyError, Result};
pub use keypair::KeyPair;
pub use logging::init_logging;
pub use report::{REPORT_COLUMNS, export_reports, sanitize_manager_name};
pub use snowflake::{SnowflakeSession, report_query};
pub use table::ResultTable;
