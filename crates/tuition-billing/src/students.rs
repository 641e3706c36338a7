//! Student lookups needed by billing

use serde::Serialize;
use tuition_academics::AcademicRegistry;
use tuition_common::{BatchId, PersonId, StudentId, TenantId};

/// Who a bill belongs to and how to reach them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentContact {
    pub student: StudentId,
    pub person: PersonId,
    pub full_name: String,
    pub enrollment_number: String,
    /// Student phone, falling back to the parent phone
    pub phone: Option<String>,
    pub parents: Vec<PersonId>,
}

/// Read-only view of enrolled students
pub trait StudentDirectory: Send + Sync {
    fn contact(&self, tenant: TenantId, student: StudentId) -> Option<StudentContact>;
    fn batch_exists(&self, tenant: TenantId, batch: BatchId) -> bool;
    fn batch_students(&self, tenant: TenantId, batch: BatchId) -> Vec<StudentId>;
}

impl StudentDirectory for AcademicRegistry {
    fn contact(&self, tenant: TenantId, student: StudentId) -> Option<StudentContact> {
        let profile = self.get_student(tenant, student).ok()?;
        let person = self.identity().get(tenant, profile.person).ok()?;
        let phone = person
            .phone
            .clone()
            .or_else(|| Some(profile.parent_phone.clone()).filter(|p| !p.is_empty()));

        Some(StudentContact {
            student,
            person: person.id,
            full_name: person.display_name().to_string(),
            enrollment_number: profile.enrollment_number,
            phone,
            parents: profile.parents.into_iter().collect(),
        })
    }

    fn batch_exists(&self, tenant: TenantId, batch: BatchId) -> bool {
        self.get_batch(tenant, batch).is_ok()
    }

    fn batch_students(&self, tenant: TenantId, batch: BatchId) -> Vec<StudentId> {
        self.students_in_batch(tenant, batch)
            .into_iter()
            .map(|profile| profile.id)
            .collect()
    }
}
