//! Domain model for accounts, projects and pause history.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field validation rules next to the data they protect.
//!
//! # Invariants
//! - Every record is identified by a storage-assigned integer id that grows
//!   with creation order.
//! - Project run/pause state is expressed through `ProjectPhase`, never
//!   through ad-hoc flags.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod pause_note;
pub mod project;
pub mod user;
