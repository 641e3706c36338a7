//! Tuition Billing Engine
//!
//! Fee structures, per-student allocations, installments and payments.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         BILLING ENGINE                           │
//! │                                                                  │
//! │  FeeStructure ──► FeeAllocation ──► Installment ◄── Payment      │
//! │   base, interval   final = base −     due, paid,     append-only │
//! │                    discount           status                     │
//! │                                          ▲                       │
//! │                                          │ paid = Σ payments     │
//! │                  record_payment ─────────┘ (installment lock)    │
//! │                                                                  │
//! │  Reports: due list │ collections │ balances │ receipts           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status is a pure function of paid and due: `Paid` when paid ≥ due,
//! `Partial` when something was paid, `Pending` otherwise. `Overdue` is a
//! display label computed by reports and never stored.

pub mod engine;
pub mod locks;
pub mod model;
pub mod receipts;
pub mod reports;
pub mod repository;
pub mod students;

pub use engine::BillingEngine;
pub use model::*;
pub use receipts::{Receipt, ReceiptRenderer, TextReceiptRenderer};
pub use reports::{AllocationSummary, CollectionSummary, DueListRow, StudentBalance};
pub use repository::{BillingRepository, InMemoryBillingRepository};
pub use students::{StudentContact, StudentDirectory};
