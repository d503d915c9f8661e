//! REST surface for the certwatch engine
//!
//! Exposes one-shot chain analysis over HTTP. The engine itself stays
//! stateless; every request triggers its own probe and chain walk.

pub mod error;
pub mod rest;

pub use error::{ApiError, ErrorResponse};
pub use rest::{create_router, ApiState};
