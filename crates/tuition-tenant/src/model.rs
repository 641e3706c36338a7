//! Tenant and Person data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tuition_common::{PersonId, TenantId};

/// Institute (tenant) definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: TenantId,
    /// Subdomain label used to resolve requests
    pub slug: String,
    /// Display name
    pub name: String,
    /// Inactive tenants no longer resolve
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Create new tenant
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            id: TenantId::new(),
            slug: slug.to_string(),
            name: name.to_string(),
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// Closed set of roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Runs the platform; belongs to no tenant
    Owner,
    InstituteAdmin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    /// All roles, in privilege order
    pub const ALL: [Role; 5] = [
        Role::Owner,
        Role::InstituteAdmin,
        Role::Teacher,
        Role::Student,
        Role::Parent,
    ];

    /// Whether a person with this role must belong to a tenant
    pub fn requires_tenant(self) -> bool {
        !matches!(self, Role::Owner)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::InstituteAdmin => "INSTITUTE_ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
            Role::Parent => "PARENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// A login: owner, staff, student or parent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// `None` only for owners
    pub tenant: Option<TenantId>,
    pub role: Role,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Person {
    /// Full name, falling back to the username
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// Person registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCreate {
    pub tenant: Option<TenantId>,
    pub role: Role,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}
