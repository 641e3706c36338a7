//! Request guards: authentication, tenant resolution, role checks

pub mod auth;
pub mod permissions;
pub mod tenant;
