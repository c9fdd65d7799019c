//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own credential hashing so callers never handle raw password storage.
//!
//! # See also
//! - crate::repo

pub mod account_service;
pub mod project_service;
