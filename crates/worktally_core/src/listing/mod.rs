//! Project listing entry points.
//!
//! # Responsibility
//! - Expose the per-user paginated project list with optional name search.
//! - Keep list result shaping inside core.
//!
//! # See also
//! - docs/architecture/http-api.md

pub mod project_list;
