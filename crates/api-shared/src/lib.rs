//! # API Shared
//!
//! Shared definitions for Askara's API surfaces.
//!
//! Contains:
//! - Request and response bodies (`dto` module) with OpenAPI schemas
//! - Conversions between those bodies and `askara_core` types
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
