//! Asynchronous export jobs.
//!
//! [`orchestrator::ExportOrchestrator`] accepts requests, tracks jobs in a
//! [`store::JobStore`] and runs each one with the best [`tier::Tier`] the probed
//! [`capabilities::Capabilities`] allow.

pub mod capabilities;
pub mod job;
pub mod orchestrator;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod tier;
