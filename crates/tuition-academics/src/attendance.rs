//! Attendance - bulk upsert keyed by (student, batch, date)

use crate::model::{AttendanceEntry, AttendanceRecord, AttendanceStatus, AttendanceSummary};
use crate::registry::AcademicRegistry;
use chrono::NaiveDate;
use tuition_common::{AttendanceId, BatchId, FieldErrors, StudentId, TenantId, TuitionError, TuitionResult};

impl AcademicRegistry {
    /// Mark attendance for a batch on a date.
    ///
    /// Every entry is checked before anything is written; an entry whose key
    /// already exists overwrites status and remarks in place. The student's
    /// current batch is not consulted, so days before a batch change can
    /// still be marked.
    pub fn mark_attendance(
        &self,
        tenant: TenantId,
        batch: BatchId,
        date: NaiveDate,
        entries: &[AttendanceEntry],
    ) -> TuitionResult<Vec<AttendanceRecord>> {
        let records = self.tables.write(tenant, |tables| {
            if !tables.batches.contains_key(&batch) {
                return Err(TuitionError::not_found("batch", batch));
            }

            let mut errors = FieldErrors::new();
            for entry in entries {
                if !tables.students.contains_key(&entry.student) {
                    errors.add("student", format!("Student {} does not exist.", entry.student));
                }
            }
            errors.into_result()?;

            let mut marked = Vec::with_capacity(entries.len());
            for entry in entries {
                let record = tables
                    .attendance
                    .entry((entry.student, batch, date))
                    .and_modify(|record| {
                        record.status = entry.status;
                        record.remarks = entry.remarks.clone();
                    })
                    .or_insert_with(|| AttendanceRecord {
                        id: AttendanceId::new(),
                        student: entry.student,
                        batch,
                        date,
                        status: entry.status,
                        remarks: entry.remarks.clone(),
                    });
                marked.push(record.clone());
            }
            Ok(marked)
        })?;

        tracing::info!(tenant = %tenant, batch = %batch, %date, count = records.len(), "attendance marked");
        Ok(records)
    }

    /// Records of a batch on a date
    pub fn attendance_for_batch(&self, tenant: TenantId, batch: BatchId, date: NaiveDate) -> Vec<AttendanceRecord> {
        self.tables.read(tenant, |tables| {
            tables
                .attendance
                .values()
                .filter(|r| r.batch == batch && r.date == date)
                .cloned()
                .collect()
        })
    }

    /// Records of one student, newest first
    pub fn attendance_for_student(&self, tenant: TenantId, student: StudentId) -> Vec<AttendanceRecord> {
        let mut records: Vec<_> = self.tables.read(tenant, |tables| {
            tables
                .attendance
                .values()
                .filter(|r| r.student == student)
                .cloned()
                .collect()
        });
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    pub fn attendance_summary(&self, tenant: TenantId, student: StudentId) -> AttendanceSummary {
        summarize(&self.attendance_for_student(tenant, student))
    }
}

fn summarize(records: &[AttendanceRecord]) -> AttendanceSummary {
    let mut summary = AttendanceSummary { total: records.len(), ..Default::default() };
    for record in records {
        match record.status {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::Absent => summary.absent += 1,
            AttendanceStatus::Excused => summary.excused += 1,
        }
    }
    if summary.total > 0 {
        let pct = summary.present as f64 / summary.total as f64 * 100.0;
        summary.percentage = (pct * 10.0).round() / 10.0;
    }
    summary
}
