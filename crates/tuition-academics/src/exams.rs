//! Exams and marks

use crate::model::{Exam, ExamCreate, ResultCreate, StudentResult};
use crate::registry::AcademicRegistry;
use rust_decimal::Decimal;
use tuition_common::error::NON_FIELD;
use tuition_common::{ExamId, FieldErrors, ResultId, StudentId, TenantId, TuitionError, TuitionResult};

const DEFAULT_MAX_MARKS: Decimal = Decimal::ONE_HUNDRED;

impl AcademicRegistry {
    pub fn create_exam(&self, tenant: TenantId, input: ExamCreate) -> TuitionResult<Exam> {
        if input.name.trim().is_empty() {
            return Err(TuitionError::invalid("name", "This field may not be blank."));
        }

        let exam = Exam {
            id: ExamId::new(),
            name: input.name.trim().to_string(),
            batch: input.batch,
            date: input.date,
        };
        self.tables.write(tenant, |tables| {
            if !tables.batches.contains_key(&exam.batch) {
                return Err(TuitionError::not_found("batch", exam.batch));
            }
            tables.exams.insert(exam.id, exam.clone());
            Ok(())
        })?;

        tracing::info!(tenant = %tenant, exam = %exam.id, batch = %exam.batch, "exam created");
        Ok(exam)
    }

    /// Exams, most recent first
    pub fn list_exams(&self, tenant: TenantId) -> Vec<Exam> {
        let mut exams: Vec<_> = self
            .tables
            .read(tenant, |tables| tables.exams.values().cloned().collect());
        exams.sort_by(|a, b| b.date.cmp(&a.date));
        exams
    }

    /// Record marks; one row per (student, exam, subject)
    pub fn record_result(&self, tenant: TenantId, input: ResultCreate) -> TuitionResult<StudentResult> {
        let max_marks = input.max_marks.unwrap_or(DEFAULT_MAX_MARKS);

        let mut errors = FieldErrors::new();
        if max_marks <= Decimal::ZERO {
            errors.add("max_marks", "Must be greater than zero.");
        }
        if input.marks_obtained < Decimal::ZERO || input.marks_obtained > max_marks {
            errors.add("marks_obtained", format!("Must be between 0 and {}.", max_marks));
        }
        errors.into_result()?;

        let result = StudentResult {
            id: ResultId::new(),
            student: input.student,
            exam: input.exam,
            subject: input.subject,
            marks_obtained: input.marks_obtained,
            max_marks,
        };

        self.tables.write(tenant, |tables| -> TuitionResult<()> {
            let exam = tables
                .exams
                .get(&result.exam)
                .ok_or_else(|| TuitionError::not_found("exam", result.exam))?;
            let student = tables
                .students
                .get(&result.student)
                .ok_or_else(|| TuitionError::not_found("student", result.student))?;
            if !tables.subjects.contains_key(&result.subject) {
                return Err(TuitionError::not_found("subject", result.subject));
            }
            if student.batch != Some(exam.batch) {
                return Err(TuitionError::invalid("student", "Student is not in the exam's batch."));
            }

            let key = (result.student, result.exam, result.subject);
            if tables.results.contains_key(&key) {
                return Err(TuitionError::conflict(
                    NON_FIELD,
                    "Marks for this student, exam and subject are already recorded.",
                ));
            }
            tables.results.insert(key, result.clone());
            Ok(())
        })?;

        tracing::info!(tenant = %tenant, exam = %result.exam, student = %result.student, "result recorded");
        Ok(result)
    }

    pub fn results_for_student(&self, tenant: TenantId, student: StudentId) -> Vec<StudentResult> {
        self.tables.read(tenant, |tables| {
            tables
                .results
                .values()
                .filter(|r| r.student == student)
                .cloned()
                .collect()
        })
    }

    pub fn results_for_exam(&self, tenant: TenantId, exam: ExamId) -> Vec<StudentResult> {
        self.tables.read(tenant, |tables| {
            tables
                .results
                .values()
                .filter(|r| r.exam == exam)
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubjectCreate;
    use crate::registry::tests::{batch, enroll_in};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tuition_tenant::IdentityRegistry;

    fn setup() -> (AcademicRegistry, TenantId, ResultCreate) {
        let registry = AcademicRegistry::new(Arc::new(IdentityRegistry::new()));
        let tenant = TenantId::new();
        let batch = batch(&registry, tenant, "Class 10");
        let student = enroll_in(&registry, tenant, Some(batch.id), "rahul", "ENR-001");
        let subject = registry
            .create_subject(
                tenant,
                SubjectCreate { name: "Physics".into(), code: "PHY".into(), description: String::new() },
            )
            .unwrap();
        let exam = registry
            .create_exam(
                tenant,
                ExamCreate {
                    name: "Internal Assessment 1".into(),
                    batch: batch.id,
                    date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
                },
            )
            .unwrap();

        let input = ResultCreate {
            student: student.id,
            exam: exam.id,
            subject: subject.id,
            marks_obtained: dec!(78.5),
            max_marks: None,
        };
        (registry, tenant, input)
    }

    #[test]
    fn test_record_result_defaults_max_marks() {
        let (registry, tenant, input) = setup();
        let result = registry.record_result(tenant, input.clone()).unwrap();

        assert_eq!(result.max_marks, dec!(100));
        assert_eq!(registry.results_for_student(tenant, input.student).len(), 1);
        assert_eq!(registry.results_for_exam(tenant, input.exam).len(), 1);
    }

    #[test]
    fn test_duplicate_result_conflicts() {
        let (registry, tenant, input) = setup();
        registry.record_result(tenant, input.clone()).unwrap();

        let err = registry.record_result(tenant, input).unwrap_err();
        assert!(matches!(err, TuitionError::Conflict(_)));
    }

    #[test]
    fn test_marks_out_of_range() {
        let (registry, tenant, mut input) = setup();
        input.marks_obtained = dec!(101);
        let err = registry.record_result(tenant, input.clone()).unwrap_err();
        assert!(err.field_errors().unwrap().get("marks_obtained").is_some());

        input.marks_obtained = dec!(40);
        input.max_marks = Some(dec!(50));
        assert!(registry.record_result(tenant, input).is_ok());
    }

    #[test]
    fn test_exam_needs_existing_batch() {
        let registry = AcademicRegistry::new(Arc::new(IdentityRegistry::new()));
        let err = registry
            .create_exam(
                TenantId::new(),
                ExamCreate {
                    name: "Finals".into(),
                    batch: tuition_common::BatchId::new(),
                    date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, TuitionError::NotFound { .. }));
    }
}
