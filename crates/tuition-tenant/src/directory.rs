//! Tenant Directory - maps subdomains to isolated partitions

use crate::model::Tenant;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tuition_common::{FieldErrors, TenantId, TuitionError, TuitionResult};

const SLUG_MIN: usize = 3;
const SLUG_MAX: usize = 50;

/// Tenant directory
pub struct TenantDirectory {
    /// All tenants
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
    /// Slug → tenant index
    slugs: Arc<RwLock<HashMap<String, TenantId>>>,
}

impl TenantDirectory {
    pub fn new() -> Self {
        Self {
            tenants: Arc::new(RwLock::new(HashMap::new())),
            slugs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check a signup before anything is written
    pub fn validate(&self, name: &str, slug: &str) -> TuitionResult<()> {
        let mut errors = FieldErrors::new();
        if name.trim().is_empty() {
            errors.add("name", "This field may not be blank.");
        }
        if let Err(message) = validate_slug(slug) {
            errors.add("subdomain", message);
        } else if self.slugs.read().contains_key(slug) {
            return Err(TuitionError::conflict("subdomain", "This subdomain is already taken."));
        }
        errors.into_result()
    }

    /// Register a new tenant
    pub fn register(&self, name: &str, slug: &str) -> TuitionResult<Tenant> {
        self.validate(name, slug)?;

        let tenant = Tenant::new(name.trim(), slug);
        {
            let mut slugs = self.slugs.write();
            // Re-check under the write lock
            if slugs.contains_key(slug) {
                return Err(TuitionError::conflict("subdomain", "This subdomain is already taken."));
            }
            slugs.insert(tenant.slug.clone(), tenant.id);
            self.tenants.write().insert(tenant.id, tenant.clone());
        }

        tracing::info!(tenant = %tenant.id, slug = %tenant.slug, "tenant registered");
        Ok(tenant)
    }

    /// Resolve a subdomain to its partition
    pub fn resolve(&self, slug: &str) -> TuitionResult<TenantId> {
        let slug = slug.trim().to_ascii_lowercase();
        let id = self
            .slugs
            .read()
            .get(&slug)
            .copied()
            .ok_or_else(|| TuitionError::not_found("tenant", &slug))?;

        match self.tenants.read().get(&id) {
            Some(tenant) if tenant.active => Ok(id),
            _ => Err(TuitionError::not_found("tenant", slug)),
        }
    }

    /// Resolve from an HTTP Host header, e.g. `galaxy.localhost:8000`
    pub fn resolve_host(&self, host: &str) -> TuitionResult<TenantId> {
        let hostname = host.split(':').next().unwrap_or_default();
        let mut labels = hostname.split('.');
        match (labels.next(), labels.next()) {
            (Some(sub), Some(_)) if !sub.is_empty() => self.resolve(sub),
            _ => Err(TuitionError::not_found("tenant", host)),
        }
    }

    /// Get tenant
    pub fn get(&self, id: TenantId) -> Option<Tenant> {
        self.tenants.read().get(&id).cloned()
    }

    /// List all tenants, newest first
    pub fn list(&self) -> Vec<Tenant> {
        let mut tenants: Vec<_> = self.tenants.read().values().cloned().collect();
        tenants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tenants
    }

    /// Stop resolving the tenant. Data stays.
    pub fn deactivate(&self, id: TenantId) -> TuitionResult<Tenant> {
        let mut tenants = self.tenants.write();
        let tenant = tenants
            .get_mut(&id)
            .ok_or_else(|| TuitionError::not_found("tenant", id))?;
        tenant.active = false;
        tracing::info!(tenant = %id, "tenant deactivated");
        Ok(tenant.clone())
    }

    /// Drop a tenant entirely; only used to roll back a failed onboarding.
    pub(crate) fn remove(&self, id: TenantId) {
        let removed = self.tenants.write().remove(&id);
        if let Some(tenant) = removed {
            self.slugs.write().remove(&tenant.slug);
        }
    }

    pub fn count(&self) -> usize {
        self.tenants.read().len()
    }
}

impl Default for TenantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.len() < SLUG_MIN || slug.len() > SLUG_MAX {
        return Err(format!("Must be between {} and {} characters.", SLUG_MIN, SLUG_MAX));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err("Only lowercase letters, digits and hyphens are allowed.".into());
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("Must not start or end with a hyphen.".into());
    }
    Ok(())
}
