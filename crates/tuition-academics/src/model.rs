//! Academic data model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tuition_common::{AttendanceId, BatchId, ExamId, PersonId, ResultId, StudentId, SubjectId};

/// A taught subject, e.g. Mathematics (MATH101)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// Unique within the institute
    pub code: String,
    pub description: String,
}

/// Subject creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCreate {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// A class group, e.g. "Class 10 - Morning Batch"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    /// Academic year label
    pub year: i32,
    pub subjects: BTreeSet<SubjectId>,
    /// Teacher-role persons
    pub teachers: BTreeSet<PersonId>,
}

/// Batch creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCreate {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
}

/// Academic profile of a Student-role person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub person: PersonId,
    pub batch: Option<BatchId>,
    /// Institute specific id, unique within the institute
    pub enrollment_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: String,
    pub parent_name: String,
    pub parent_phone: String,
    /// Parent-role persons linked to this student
    pub parents: BTreeSet<PersonId>,
}

/// Enrollment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentEnroll {
    pub person: PersonId,
    pub batch: Option<BatchId>,
    pub enrollment_number: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub parent_phone: String,
}

/// Attendance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Excused => "EXCUSED",
        };
        f.write_str(label)
    }
}

/// One (student, batch, date) attendance row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub student: StudentId,
    pub batch: BatchId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: String,
}

/// One entry of a bulk attendance mark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student: StudentId,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub remarks: String,
}

/// Per-student attendance totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub excused: usize,
    /// present / total × 100, one decimal
    pub percentage: f64,
}

/// An assessment held for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub name: String,
    pub batch: BatchId,
    pub date: NaiveDate,
}

/// Exam creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamCreate {
    pub name: String,
    pub batch: BatchId,
    pub date: NaiveDate,
}

/// Marks of one student in one subject of one exam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResult {
    pub id: ResultId,
    pub student: StudentId,
    pub exam: ExamId,
    pub subject: SubjectId,
    pub marks_obtained: Decimal,
    pub max_marks: Decimal,
}

/// Result entry request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCreate {
    pub student: StudentId,
    pub exam: ExamId,
    pub subject: SubjectId,
    pub marks_obtained: Decimal,
    /// Defaults to 100
    #[serde(default)]
    pub max_marks: Option<Decimal>,
}
