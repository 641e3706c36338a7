//! Tenant Directory and Identity
//!
//! Institutes, the people who belong to them, and what each role may do.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   Host / X-Tenant ──► TENANT DIRECTORY ──► TenantId          │
//! │                                              │               │
//! │                        IDENTITY REGISTRY ◄───┘               │
//! │                  Owner │ Admin │ Teacher │ Student │ Parent  │
//! │                                  │                           │
//! │                     can(role, operation) ──► allow / 403     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod capabilities;
pub mod directory;
pub mod identity;
pub mod lifecycle;
pub mod model;

pub use capabilities::{can, operations_for, Operation};
pub use directory::TenantDirectory;
pub use identity::IdentityRegistry;
pub use lifecycle::{TenantLifecycle, TenantSignup};
pub use model::{Person, PersonCreate, Role, Tenant};
