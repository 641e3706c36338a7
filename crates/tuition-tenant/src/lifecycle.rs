//! Tenant Lifecycle - onboarding a new institute

use crate::directory::TenantDirectory;
use crate::identity::IdentityRegistry;
use crate::model::{Person, PersonCreate, Role, Tenant};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tuition_common::{TenantId, TuitionResult};
#[cfg(test)]
use tuition_common::TuitionError;

/// Signup request for a new institute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSignup {
    pub institute_name: String,
    /// e.g. `galaxy` for `galaxy.<domain>`
    pub subdomain: String,
    pub admin_username: String,
    pub admin_email: String,
    #[serde(default)]
    pub admin_full_name: String,
}

/// Onboarding: tenant plus its first administrator, all or nothing
pub struct TenantLifecycle {
    directory: Arc<TenantDirectory>,
    identity: Arc<IdentityRegistry>,
}

impl TenantLifecycle {
    pub fn new(directory: Arc<TenantDirectory>, identity: Arc<IdentityRegistry>) -> Self {
        Self { directory, identity }
    }

    /// Onboard a new institute
    pub fn onboard(&self, signup: TenantSignup) -> TuitionResult<(Tenant, Person)> {
        let subdomain = signup.subdomain.trim().to_string();
        let admin = |tenant: TenantId| PersonCreate {
            tenant: Some(tenant),
            role: Role::InstituteAdmin,
            username: signup.admin_username.clone(),
            full_name: signup.admin_full_name.clone(),
            email: signup.admin_email.clone(),
            phone: None,
        };

        // Validate both halves before writing either
        self.directory.validate(&signup.institute_name, &subdomain)?;
        self.identity.validate(&admin(TenantId::new()))?;

        let tenant = self.directory.register(&signup.institute_name, &subdomain)?;
        match self.identity.register(admin(tenant.id)) {
            Ok(person) => {
                tracing::info!(tenant = %tenant.id, admin = %person.id, "institute onboarded");
                Ok((tenant, person))
            }
            Err(err) => {
                tracing::warn!(tenant = %tenant.id, error = %err, "onboarding rolled back");
                self.directory.remove(tenant.id);
                Err(err)
            }
        }
    }

    /// Deactivate an institute
    pub fn deactivate(&self, tenant: TenantId) -> TuitionResult<Tenant> {
        self.directory.deactivate(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> (TenantLifecycle, Arc<TenantDirectory>, Arc<IdentityRegistry>) {
        let directory = Arc::new(TenantDirectory::new());
        let identity = Arc::new(IdentityRegistry::new());
        (
            TenantLifecycle::new(directory.clone(), identity.clone()),
            directory,
            identity,
        )
    }

    fn signup(subdomain: &str, email: &str) -> TenantSignup {
        TenantSignup {
            institute_name: "Galaxy Academy".into(),
            subdomain: subdomain.into(),
            admin_username: "admin".into(),
            admin_email: email.into(),
            admin_full_name: "Galaxy Admin".into(),
        }
    }

    #[test]
    fn test_onboard_creates_tenant_and_admin() {
        let (lifecycle, directory, identity) = lifecycle();
        let (tenant, admin) = lifecycle.onboard(signup("galaxy", "owner@galaxy.com")).unwrap();

        assert_eq!(directory.resolve("galaxy").unwrap(), tenant.id);
        assert_eq!(admin.role, Role::InstituteAdmin);
        assert_eq!(admin.tenant, Some(tenant.id));
        assert_eq!(identity.list(tenant.id, None).len(), 1);
    }

    #[test]
    fn test_bad_admin_leaves_no_tenant() {
        let (lifecycle, directory, _) = lifecycle();
        let err = lifecycle.onboard(signup("galaxy", "not-an-email")).unwrap_err();

        assert!(matches!(err, TuitionError::Validation(_)));
        assert_eq!(directory.count(), 0);
        assert!(directory.resolve("galaxy").is_err());
    }

    #[test]
    fn test_taken_subdomain() {
        let (lifecycle, directory, _) = lifecycle();
        lifecycle.onboard(signup("galaxy", "a@galaxy.com")).unwrap();

        let err = lifecycle.onboard(signup("galaxy", "b@galaxy.com")).unwrap_err();
        assert!(matches!(err, TuitionError::Conflict(_)));
        assert_eq!(directory.count(), 1);
    }
}
