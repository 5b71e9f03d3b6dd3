//! # Backbone API — web application backend scaffold
//!
//! HTTP controllers, request-scoped context propagation, response/error
//! envelope normalization, configuration loading and third-party
//! integrations (Postgres, S3, localized messages), wired together as a
//! reusable service skeleton.
//!
//! ## Layers
//!
//! - **API**: axum handlers, routing, envelope and context middleware
//! - **Application**: services and repository ports
//! - **Infrastructure**: Postgres and S3 adapters
//!
//! ## Request flow
//!
//! inbound request → context populator fills the task-local
//! [`context::RequestContext`] → handler/service logic (free to read the
//! context) → success envelope transformer wraps the JSON result, or one of
//! the error translators in [`api::errors`] shapes the failure.

pub mod api;
pub mod application;
pub mod config;
pub mod context;
pub mod i18n;
pub mod infrastructure;

pub use api::router::AppState;
pub use config::Settings;
pub use context::RequestContext;
