//! Authorization engine.
//!
//! Decisions are made in two steps:
//!
//! 1. The static policy table ([`table`]) maps `(Action, Role)` to a
//!    [`Grant`]. No entry means DENY.
//! 2. Grants that depend on ownership are resolved by the [`PolicyEngine`]
//!    through an [`OwnershipResolver`], which looks up the owning user of a
//!    patient or provider row.
//!
//! # Example
//!
//! ```ignore
//! use clinic_auth::policy::{Action, PolicyEngine, ResourceRef};
//!
//! let allowed = PolicyEngine::new()
//!     .authorize(&principal, Action::ReadPatient, &ResourceRef::Patient(id), resolver)
//!     .await?;
//! ```

pub mod engine;
pub mod table;

pub use engine::{AccessDecision, Allowed, DenyReason, OwnershipResolver, PolicyEngine, ResourceRef};
pub use table::{Action, Grant, grant_for};
