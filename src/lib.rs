//! AccessDesk — self-service data access requests for trusted research
//! environments.
//!
//! Researchers draft and submit requests for dataset access; data managers
//! review them (approve, reject, or return for changes), with every change
//! and comment captured in an append-only feed per request. The lifecycle
//! rules live in [`lifecycle`], shared by every [`store`] backend, and the
//! [`client`] module provides the headless view-models a UI shell composes.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod notification;
pub mod store;

use notification::provisioner::PipelineTrigger;
use store::RequestStore;

/// Shared application state passed to handlers.
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub provisioner: PipelineTrigger,
    pub config: config::Config,
}
