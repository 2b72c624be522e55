//! URL handling module
//!
//! This module provides the domain key used for per-domain rate limiting and
//! link resolution for pagination and extracted URL fields.

mod domain;
mod resolve;

pub use domain::domain_key;
pub use resolve::{resolve_against, resolve_link};
