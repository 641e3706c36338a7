//! Identity & Role Registry

use crate::model::{Person, PersonCreate, Role};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tuition_common::{FieldErrors, PartitionStore, PersonId, TenantId, TuitionError, TuitionResult};

/// People of one tenant
#[derive(Default)]
struct PeopleTable {
    people: HashMap<PersonId, Person>,
    usernames: HashMap<String, PersonId>,
}

impl PeopleTable {
    fn insert(&mut self, person: Person) -> TuitionResult<()> {
        let key = person.username.to_lowercase();
        if self.usernames.contains_key(&key) {
            return Err(TuitionError::conflict("username", "A user with that username already exists."));
        }
        self.usernames.insert(key, person.id);
        self.people.insert(person.id, person);
        Ok(())
    }
}

/// Identity registry
pub struct IdentityRegistry {
    /// Tenant → people
    members: PartitionStore<PeopleTable>,
    /// Platform owners (tenantless)
    owners: Arc<RwLock<PeopleTable>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            members: PartitionStore::new(),
            owners: Arc::new(RwLock::new(PeopleTable::default())),
        }
    }

    /// Check a registration request
    pub fn validate(&self, input: &PersonCreate) -> TuitionResult<()> {
        let mut errors = FieldErrors::new();
        match (input.role.requires_tenant(), input.tenant) {
            (true, None) => errors.add("tenant", "This role must belong to an institute."),
            (false, Some(_)) => errors.add("tenant", "Owners do not belong to an institute."),
            _ => {}
        }
        if input.username.trim().is_empty() {
            errors.add("username", "This field may not be blank.");
        }
        if !input.email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result()
    }

    /// Register a person
    pub fn register(&self, input: PersonCreate) -> TuitionResult<Person> {
        self.validate(&input)?;

        let person = Person {
            id: PersonId::new(),
            tenant: input.tenant,
            role: input.role,
            username: input.username.trim().to_string(),
            full_name: input.full_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            active: true,
            created_at: Utc::now(),
        };

        match person.tenant {
            Some(tenant) => self.members.write(tenant, |table| table.insert(person.clone()))?,
            None => self.owners.write().insert(person.clone())?,
        }

        tracing::info!(person = %person.id, role = %person.role, "person registered");
        Ok(person)
    }

    /// Get a member of the tenant
    pub fn get(&self, tenant: TenantId, id: PersonId) -> TuitionResult<Person> {
        self.members
            .read(tenant, |table| table.people.get(&id).cloned())
            .ok_or_else(|| TuitionError::not_found("person", id))
    }

    /// Get a member and require a role
    pub fn get_with_role(&self, tenant: TenantId, id: PersonId, role: Role) -> TuitionResult<Person> {
        let person = self.get(tenant, id)?;
        if person.role != role {
            return Err(TuitionError::invalid(
                "person",
                format!("Person {} is not a {}.", id, role),
            ));
        }
        Ok(person)
    }

    /// Get a platform owner
    pub fn get_owner(&self, id: PersonId) -> TuitionResult<Person> {
        self.owners
            .read()
            .people
            .get(&id)
            .cloned()
            .ok_or_else(|| TuitionError::not_found("person", id))
    }

    /// List members, optionally filtered by role, sorted by username
    pub fn list(&self, tenant: TenantId, role: Option<Role>) -> Vec<Person> {
        let mut people = self.members.read(tenant, |table| {
            table
                .people
                .values()
                .filter(|p| role.map_or(true, |r| p.role == r))
                .cloned()
                .collect::<Vec<_>>()
        });
        people.sort_by(|a, b| a.username.cmp(&b.username));
        people
    }

    pub fn count(&self, tenant: TenantId) -> usize {
        self.members.read(tenant, |table| table.people.len())
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
