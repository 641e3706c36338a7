//! Academic Registry - subjects, batches and student profiles

use crate::model::*;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tuition_common::{
    BatchId, ExamId, FieldErrors, PartitionStore, PersonId, StudentId, SubjectId, TenantId,
    TuitionError, TuitionResult,
};
use tuition_tenant::{IdentityRegistry, Role};

/// Everything academic that belongs to one institute
#[derive(Default)]
pub(crate) struct AcademicTables {
    pub(crate) subjects: HashMap<SubjectId, Subject>,
    /// Lowercased code → subject
    pub(crate) subject_codes: HashMap<String, SubjectId>,
    pub(crate) batches: HashMap<BatchId, Batch>,
    pub(crate) students: HashMap<StudentId, StudentProfile>,
    pub(crate) enrollment_numbers: HashMap<String, StudentId>,
    /// Person → their one profile
    pub(crate) profiles_by_person: HashMap<PersonId, StudentId>,
    pub(crate) attendance: HashMap<(StudentId, BatchId, NaiveDate), AttendanceRecord>,
    pub(crate) exams: HashMap<ExamId, Exam>,
    pub(crate) results: HashMap<(StudentId, ExamId, SubjectId), StudentResult>,
}

/// Academic registry
pub struct AcademicRegistry {
    pub(crate) tables: PartitionStore<AcademicTables>,
    pub(crate) identity: Arc<IdentityRegistry>,
}

impl AcademicRegistry {
    pub fn new(identity: Arc<IdentityRegistry>) -> Self {
        Self {
            tables: PartitionStore::new(),
            identity,
        }
    }

    /// People registry the profiles point into
    pub fn identity(&self) -> &IdentityRegistry {
        &self.identity
    }

    // ----- Subjects -----

    /// Create a subject; codes are unique per institute, case-insensitively
    pub fn create_subject(&self, tenant: TenantId, input: SubjectCreate) -> TuitionResult<Subject> {
        let mut errors = FieldErrors::new();
        if input.name.trim().is_empty() {
            errors.add("name", "This field may not be blank.");
        }
        if input.code.trim().is_empty() {
            errors.add("code", "This field may not be blank.");
        }
        errors.into_result()?;

        let subject = Subject {
            id: SubjectId::new(),
            name: input.name.trim().to_string(),
            code: input.code.trim().to_string(),
            description: input.description,
        };

        self.tables.write(tenant, |tables| {
            let key = subject.code.to_lowercase();
            if tables.subject_codes.contains_key(&key) {
                return Err(TuitionError::conflict("code", "A subject with this code already exists."));
            }
            tables.subject_codes.insert(key, subject.id);
            tables.subjects.insert(subject.id, subject.clone());
            Ok(())
        })?;

        tracing::info!(tenant = %tenant, subject = %subject.id, code = %subject.code, "subject created");
        Ok(subject)
    }

    /// Subjects sorted by code
    pub fn list_subjects(&self, tenant: TenantId) -> Vec<Subject> {
        let mut subjects: Vec<_> = self
            .tables
            .read(tenant, |tables| tables.subjects.values().cloned().collect());
        subjects.sort_by(|a, b| a.code.cmp(&b.code));
        subjects
    }

    // ----- Batches -----

    pub fn create_batch(&self, tenant: TenantId, input: BatchCreate) -> TuitionResult<Batch> {
        if input.name.trim().is_empty() {
            return Err(TuitionError::invalid("name", "This field may not be blank."));
        }

        let batch = self.tables.write(tenant, |tables| -> TuitionResult<Batch> {
            let subjects = known_subjects(tables, &input.subjects)?;
            let batch = Batch {
                id: BatchId::new(),
                name: input.name.trim().to_string(),
                year: input.year,
                subjects,
                teachers: BTreeSet::new(),
            };
            tables.batches.insert(batch.id, batch.clone());
            Ok(batch)
        })?;

        tracing::info!(tenant = %tenant, batch = %batch.id, name = %batch.name, "batch created");
        Ok(batch)
    }

    pub fn get_batch(&self, tenant: TenantId, id: BatchId) -> TuitionResult<Batch> {
        self.tables
            .read(tenant, |tables| tables.batches.get(&id).cloned())
            .ok_or_else(|| TuitionError::not_found("batch", id))
    }

    /// Batches, newest year first
    pub fn list_batches(&self, tenant: TenantId) -> Vec<Batch> {
        let mut batches: Vec<_> = self
            .tables
            .read(tenant, |tables| tables.batches.values().cloned().collect());
        batches.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.name.cmp(&b.name)));
        batches
    }

    /// Batches a teacher is assigned to
    pub fn batches_for_teacher(&self, tenant: TenantId, teacher: PersonId) -> Vec<Batch> {
        self.list_batches(tenant)
            .into_iter()
            .filter(|batch| batch.teachers.contains(&teacher))
            .collect()
    }

    /// Replace the batch's subject set
    pub fn assign_subjects(
        &self,
        tenant: TenantId,
        batch: BatchId,
        subjects: &[SubjectId],
    ) -> TuitionResult<Batch> {
        self.tables.write(tenant, |tables| -> TuitionResult<Batch> {
            let subjects = known_subjects(tables, subjects)?;
            let batch = tables
                .batches
                .get_mut(&batch)
                .ok_or_else(|| TuitionError::not_found("batch", batch))?;
            batch.subjects = subjects;
            Ok(batch.clone())
        })
    }

    /// Replace the batch's teachers; every person must be a Teacher of
    /// this institute
    pub fn assign_teachers(
        &self,
        tenant: TenantId,
        batch: BatchId,
        teachers: &[PersonId],
    ) -> TuitionResult<Batch> {
        for teacher in teachers {
            self.identity.get_with_role(tenant, *teacher, Role::Teacher)?;
        }

        self.tables.write(tenant, |tables| -> TuitionResult<Batch> {
            let batch = tables
                .batches
                .get_mut(&batch)
                .ok_or_else(|| TuitionError::not_found("batch", batch))?;
            batch.teachers = teachers.iter().copied().collect();
            Ok(batch.clone())
        })
    }

    // ----- Students -----

    /// Create the academic profile of a Student-role person
    pub fn enroll(&self, tenant: TenantId, input: StudentEnroll) -> TuitionResult<StudentProfile> {
        self.identity.get_with_role(tenant, input.person, Role::Student)?;
        if input.enrollment_number.trim().is_empty() {
            return Err(TuitionError::invalid("enrollment_number", "This field may not be blank."));
        }

        let profile = StudentProfile {
            id: StudentId::new(),
            person: input.person,
            batch: input.batch,
            enrollment_number: input.enrollment_number.trim().to_string(),
            date_of_birth: input.date_of_birth,
            address: input.address,
            parent_name: input.parent_name,
            parent_phone: input.parent_phone,
            parents: BTreeSet::new(),
        };

        self.tables.write(tenant, |tables| {
            if let Some(batch) = profile.batch {
                if !tables.batches.contains_key(&batch) {
                    return Err(TuitionError::not_found("batch", batch));
                }
            }
            if tables.profiles_by_person.contains_key(&profile.person) {
                return Err(TuitionError::conflict("person", "This person already has a student profile."));
            }
            if tables.enrollment_numbers.contains_key(&profile.enrollment_number) {
                return Err(TuitionError::conflict(
                    "enrollment_number",
                    "A student with this enrollment number already exists.",
                ));
            }
            tables.profiles_by_person.insert(profile.person, profile.id);
            tables.enrollment_numbers.insert(profile.enrollment_number.clone(), profile.id);
            tables.students.insert(profile.id, profile.clone());
            Ok(())
        })?;

        tracing::info!(
            tenant = %tenant,
            student = %profile.id,
            enrollment = %profile.enrollment_number,
            "student enrolled"
        );
        Ok(profile)
    }

    /// Link a Parent-role person to a student
    pub fn link_parent(
        &self,
        tenant: TenantId,
        student: StudentId,
        parent: PersonId,
    ) -> TuitionResult<StudentProfile> {
        self.identity.get_with_role(tenant, parent, Role::Parent)?;

        self.tables.write(tenant, |tables| -> TuitionResult<StudentProfile> {
            let profile = tables
                .students
                .get_mut(&student)
                .ok_or_else(|| TuitionError::not_found("student", student))?;
            profile.parents.insert(parent);
            Ok(profile.clone())
        })
    }

    pub fn get_student(&self, tenant: TenantId, id: StudentId) -> TuitionResult<StudentProfile> {
        self.tables
            .read(tenant, |tables| tables.students.get(&id).cloned())
            .ok_or_else(|| TuitionError::not_found("student", id))
    }

    /// Students sorted by enrollment number
    pub fn list_students(&self, tenant: TenantId) -> Vec<StudentProfile> {
        let mut students: Vec<_> = self
            .tables
            .read(tenant, |tables| tables.students.values().cloned().collect());
        students.sort_by(|a, b| a.enrollment_number.cmp(&b.enrollment_number));
        students
    }

    /// Profile of a Student-role person, if enrolled
    pub fn profile_for_person(&self, tenant: TenantId, person: PersonId) -> Option<StudentProfile> {
        self.tables.read(tenant, |tables| {
            tables
                .profiles_by_person
                .get(&person)
                .and_then(|id| tables.students.get(id))
                .cloned()
        })
    }

    /// Students linked to a parent
    pub fn children_of(&self, tenant: TenantId, parent: PersonId) -> Vec<StudentProfile> {
        self.list_students(tenant)
            .into_iter()
            .filter(|student| student.parents.contains(&parent))
            .collect()
    }

    pub fn students_in_batch(&self, tenant: TenantId, batch: BatchId) -> Vec<StudentProfile> {
        self.list_students(tenant)
            .into_iter()
            .filter(|student| student.batch == Some(batch))
            .collect()
    }
}

fn known_subjects(tables: &AcademicTables, ids: &[SubjectId]) -> TuitionResult<BTreeSet<SubjectId>> {
    let mut errors = FieldErrors::new();
    for id in ids {
        if !tables.subjects.contains_key(id) {
            errors.add("subjects", format!("Subject {} does not exist.", id));
        }
    }
    errors.into_result()?;
    Ok(ids.iter().copied().collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tuition_tenant::{Person, PersonCreate};

    pub(crate) fn person(identity: &IdentityRegistry, tenant: TenantId, role: Role, username: &str) -> Person {
        identity
            .register(PersonCreate {
                tenant: Some(tenant),
                role,
                username: username.into(),
                full_name: username.to_uppercase(),
                email: format!("{}@example.com", username),
                phone: None,
            })
            .unwrap()
    }

    pub(crate) fn enroll_in(
        registry: &AcademicRegistry,
        tenant: TenantId,
        batch: Option<BatchId>,
        username: &str,
        enrollment: &str,
    ) -> StudentProfile {
        let person = person(&registry.identity, tenant, Role::Student, username);
        registry
            .enroll(
                tenant,
                StudentEnroll {
                    person: person.id,
                    batch,
                    enrollment_number: enrollment.into(),
                    date_of_birth: None,
                    address: String::new(),
                    parent_name: String::new(),
                    parent_phone: String::new(),
                },
            )
            .unwrap()
    }

    pub(crate) fn batch(registry: &AcademicRegistry, tenant: TenantId, name: &str) -> Batch {
        registry
            .create_batch(tenant, BatchCreate { name: name.into(), year: 2026, subjects: vec![] })
            .unwrap()
    }

    fn registry() -> AcademicRegistry {
        AcademicRegistry::new(Arc::new(IdentityRegistry::new()))
    }

    #[test]
    fn test_subject_code_unique_per_tenant() {
        let registry = registry();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let maths = SubjectCreate { name: "Mathematics".into(), code: "MATH101".into(), description: String::new() };

        registry.create_subject(tenant_a, maths.clone()).unwrap();
        let err = registry
            .create_subject(tenant_a, SubjectCreate { code: "math101".into(), ..maths.clone() })
            .unwrap_err();
        assert!(matches!(err, TuitionError::Conflict(_)));

        registry.create_subject(tenant_b, maths).unwrap();
        assert_eq!(registry.list_subjects(tenant_a).len(), 1);
    }

    #[test]
    fn test_batch_rejects_unknown_subject() {
        let registry = registry();
        let tenant = TenantId::new();
        let err = registry
            .create_batch(
                tenant,
                BatchCreate { name: "Class 10".into(), year: 2026, subjects: vec![SubjectId::new()] },
            )
            .unwrap_err();
        assert!(err.field_errors().unwrap().get("subjects").is_some());
    }

    #[test]
    fn test_assign_teachers_requires_teacher_role() {
        let registry = registry();
        let tenant = TenantId::new();
        let batch = batch(&registry, tenant, "Class 10");
        let teacher = person(&registry.identity, tenant, Role::Teacher, "meera");
        let student = person(&registry.identity, tenant, Role::Student, "rahul");

        let updated = registry.assign_teachers(tenant, batch.id, &[teacher.id]).unwrap();
        assert!(updated.teachers.contains(&teacher.id));
        assert_eq!(registry.batches_for_teacher(tenant, teacher.id).len(), 1);

        assert!(registry.assign_teachers(tenant, batch.id, &[student.id]).is_err());
    }

    #[test]
    fn test_enroll_once_per_person() {
        let registry = registry();
        let tenant = TenantId::new();
        let batch = batch(&registry, tenant, "Class 10");
        let profile = enroll_in(&registry, tenant, Some(batch.id), "rahul", "ENR-001");

        let again = registry.enroll(
            tenant,
            StudentEnroll {
                person: profile.person,
                batch: None,
                enrollment_number: "ENR-002".into(),
                date_of_birth: None,
                address: String::new(),
                parent_name: String::new(),
                parent_phone: String::new(),
            },
        );
        assert!(matches!(again, Err(TuitionError::Conflict(_))));
        assert_eq!(registry.profile_for_person(tenant, profile.person).unwrap().id, profile.id);
        assert_eq!(registry.students_in_batch(tenant, batch.id).len(), 1);
    }

    #[test]
    fn test_enrollment_number_unique() {
        let registry = registry();
        let tenant = TenantId::new();
        enroll_in(&registry, tenant, None, "rahul", "ENR-001");

        let person = person(&registry.identity, tenant, Role::Student, "priya");
        let err = registry
            .enroll(
                tenant,
                StudentEnroll {
                    person: person.id,
                    batch: None,
                    enrollment_number: "ENR-001".into(),
                    date_of_birth: None,
                    address: String::new(),
                    parent_name: String::new(),
                    parent_phone: String::new(),
                },
            )
            .unwrap_err();
        assert!(err.field_errors().unwrap().get("enrollment_number").is_some());
    }

    #[test]
    fn test_parent_links() {
        let registry = registry();
        let tenant = TenantId::new();
        let student = enroll_in(&registry, tenant, None, "rahul", "ENR-001");
        let parent = person(&registry.identity, tenant, Role::Parent, "sunita");

        registry.link_parent(tenant, student.id, parent.id).unwrap();
        assert_eq!(registry.children_of(tenant, parent.id)[0].id, student.id);

        // A teacher cannot be linked as a parent
        let teacher = person(&registry.identity, tenant, Role::Teacher, "meera");
        assert!(registry.link_parent(tenant, student.id, teacher.id).is_err());
    }

    #[test]
    fn test_students_isolated_by_tenant() {
        let registry = registry();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let student = enroll_in(&registry, tenant_a, None, "rahul", "ENR-001");

        assert!(registry.list_students(tenant_b).is_empty());
        assert!(matches!(
            registry.get_student(tenant_b, student.id),
            Err(TuitionError::NotFound { .. })
        ));
    }
}
