//! Common utilities for the Vellum rendering pipeline.
//!
//! This crate provides shared infrastructure used by all pipeline components:
//! - **Warning System** - deduplicated warnings routed through `tracing`
//! - **Observables** - [`Property`] value containers and [`Emitter`] channels
//! - **Configuration** - [`PipelineConfig`], loadable from JSON

pub mod config;
pub mod observe;
pub mod warning;

pub use config::{ConfigError, DEFAULT_MAX_LAYOUT_RETRIES, PipelineConfig};
pub use observe::{Emitter, ListenerId, Property};
