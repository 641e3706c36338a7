//! API Routes

pub mod academics;
pub mod dashboard;
pub mod fees;
pub mod health;
pub mod payments;
pub mod receipts;
pub mod reports;
pub mod tenants;
pub mod users;
