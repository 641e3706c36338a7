//! Tuition ERP shared foundations
//!
//! Everything a tenant-scoped engine needs before it can hold a single row:
//! strongly typed identifiers, the error taxonomy surfaced to callers, and
//! the partitioned store that makes every read and write name its tenant.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    PARTITION STORE                        │
//! │   TenantId ─► ┌──────────┐  ┌──────────┐  ┌──────────┐    │
//! │               │ tenant A │  │ tenant B │  │ tenant C │    │
//! │               └──────────┘  └──────────┘  └──────────┘    │
//! │   no accessor exists that spans two partitions            │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod ids;
pub mod money;
pub mod partition;
pub mod repository;

pub use error::{FieldErrors, TuitionError, TuitionResult, NON_FIELD};
pub use ids::*;
pub use partition::PartitionStore;
pub use repository::{RepoResult, RepositoryError};
