//! Subjects, batches, students, attendance, exams and results

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::permissions::{ensure_visible, require, require_any, visible_students};
use crate::middleware::tenant::TenantScope;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tuition_academics::{
    AttendanceEntry, AttendanceRecord, AttendanceSummary, Batch, BatchCreate, Exam, ExamCreate, ResultCreate,
    StudentEnroll, StudentProfile, StudentResult, Subject, SubjectCreate,
};
use tuition_common::{BatchId, ExamId, PersonId, StudentId, SubjectId, TuitionError};
use tuition_tenant::{Operation, Role};
use uuid::Uuid;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/subjects", get(list_subjects).post(create_subject))
        .route("/batches", get(list_batches).post(create_batch))
        .route("/batches/:id/subjects", put(assign_subjects))
        .route("/batches/:id/teachers", put(assign_teachers))
        .route("/students", get(list_students).post(enroll_student))
        .route("/students/:id/parents", post(link_parent))
        .route("/students/:id/attendance", get(student_attendance))
        .route("/attendance", get(batch_attendance).post(mark_attendance))
        .route("/exams", get(list_exams).post(create_exam))
        .route("/results", get(list_results).post(record_result))
}

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

fn created<T>(data: T) -> Created<T> {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

// ============ Subjects & batches ============

pub async fn list_subjects(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Vec<Subject>>>> {
    require(&scope.user, Operation::ViewAcademics)?;
    Ok(Json(ApiResponse::success(state.academics.list_subjects(scope.tenant))))
}

pub async fn create_subject(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<SubjectCreate>,
) -> ApiResult<Created<Subject>> {
    require(&scope.user, Operation::ManageAcademics)?;
    Ok(created(state.academics.create_subject(scope.tenant, input)?))
}

pub async fn list_batches(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Vec<Batch>>>> {
    require(&scope.user, Operation::ViewAcademics)?;
    let batches = match scope.user.role {
        Role::Teacher => state.academics.batches_for_teacher(scope.tenant, scope.user.id),
        _ => state.academics.list_batches(scope.tenant),
    };
    Ok(Json(ApiResponse::success(batches)))
}

pub async fn create_batch(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<BatchCreate>,
) -> ApiResult<Created<Batch>> {
    require(&scope.user, Operation::ManageAcademics)?;
    Ok(created(state.academics.create_batch(scope.tenant, input)?))
}

#[derive(Deserialize)]
pub struct SubjectAssignment {
    subjects: Vec<SubjectId>,
}

pub async fn assign_subjects(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<SubjectAssignment>,
) -> ApiResult<Json<ApiResponse<Batch>>> {
    require(&scope.user, Operation::ManageAcademics)?;
    let batch = state
        .academics
        .assign_subjects(scope.tenant, BatchId::from(id), &input.subjects)?;
    Ok(Json(ApiResponse::success(batch)))
}

#[derive(Deserialize)]
pub struct TeacherAssignment {
    teachers: Vec<PersonId>,
}

pub async fn assign_teachers(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<TeacherAssignment>,
) -> ApiResult<Json<ApiResponse<Batch>>> {
    require(&scope.user, Operation::ManageAcademics)?;
    let batch = state
        .academics
        .assign_teachers(scope.tenant, BatchId::from(id), &input.teachers)?;
    Ok(Json(ApiResponse::success(batch)))
}

// ============ Students ============

pub async fn list_students(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Vec<StudentProfile>>>> {
    require_any(&scope.user, &[Operation::ViewAcademics, Operation::ViewFees])?;
    let mut students = state.academics.list_students(scope.tenant);
    if let Some(visible) = visible_students(&state, &scope) {
        students.retain(|s| visible.contains(&s.id));
    }
    Ok(Json(ApiResponse::success(students)))
}

pub async fn enroll_student(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<StudentEnroll>,
) -> ApiResult<Created<StudentProfile>> {
    require(&scope.user, Operation::ManagePeople)?;
    Ok(created(state.academics.enroll(scope.tenant, input)?))
}

#[derive(Deserialize)]
pub struct ParentLink {
    parent: PersonId,
}

pub async fn link_parent(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ParentLink>,
) -> ApiResult<Json<ApiResponse<StudentProfile>>> {
    require(&scope.user, Operation::ManagePeople)?;
    let profile = state
        .academics
        .link_parent(scope.tenant, StudentId::from(id), input.parent)?;
    Ok(Json(ApiResponse::success(profile)))
}

// ============ Attendance ============

#[derive(Deserialize)]
pub struct AttendanceSheet {
    batch: BatchId,
    date: NaiveDate,
    entries: Vec<AttendanceEntry>,
}

pub async fn mark_attendance(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(sheet): ApiJson<AttendanceSheet>,
) -> ApiResult<Json<ApiResponse<Vec<AttendanceRecord>>>> {
    require(&scope.user, Operation::MarkAttendance)?;
    if scope.user.role == Role::Teacher {
        let batch = state.academics.get_batch(scope.tenant, sheet.batch)?;
        if !batch.teachers.contains(&scope.user.id) {
            return Err(ApiError::forbidden());
        }
    }
    let records = state
        .academics
        .mark_attendance(scope.tenant, sheet.batch, sheet.date, &sheet.entries)?;
    Ok(Json(ApiResponse::success(records)))
}

#[derive(Deserialize)]
pub struct AttendanceQuery {
    batch: BatchId,
    date: NaiveDate,
}

pub async fn batch_attendance(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(query): ApiQuery<AttendanceQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AttendanceRecord>>>> {
    require(&scope.user, Operation::ViewAttendance)?;
    let mut records = state.academics.attendance_for_batch(scope.tenant, query.batch, query.date);
    if let Some(visible) = visible_students(&state, &scope) {
        records.retain(|r| visible.contains(&r.student));
    }
    Ok(Json(ApiResponse::success(records)))
}

#[derive(Serialize)]
pub struct StudentAttendance {
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceRecord>,
}

pub async fn student_attendance(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<StudentAttendance>>> {
    require(&scope.user, Operation::ViewAttendance)?;
    let student = StudentId::from(id);
    state.academics.get_student(scope.tenant, student)?;
    ensure_visible(&state, &scope, student)?;

    Ok(Json(ApiResponse::success(StudentAttendance {
        summary: state.academics.attendance_summary(scope.tenant, student),
        records: state.academics.attendance_for_student(scope.tenant, student),
    })))
}

// ============ Exams & results ============

pub async fn list_exams(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Vec<Exam>>>> {
    require(&scope.user, Operation::ViewResults)?;
    Ok(Json(ApiResponse::success(state.academics.list_exams(scope.tenant))))
}

pub async fn create_exam(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<ExamCreate>,
) -> ApiResult<Created<Exam>> {
    require(&scope.user, Operation::ManageExams)?;
    Ok(created(state.academics.create_exam(scope.tenant, input)?))
}

pub async fn record_result(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<ResultCreate>,
) -> ApiResult<Created<StudentResult>> {
    require(&scope.user, Operation::RecordResults)?;
    Ok(created(state.academics.record_result(scope.tenant, input)?))
}

#[derive(Deserialize)]
pub struct ResultQuery {
    student: Option<StudentId>,
    exam: Option<ExamId>,
}

pub async fn list_results(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(query): ApiQuery<ResultQuery>,
) -> ApiResult<Json<ApiResponse<Vec<StudentResult>>>> {
    require(&scope.user, Operation::ViewResults)?;
    let visible = visible_students(&state, &scope);

    let mut results = match (query.student, query.exam, &visible) {
        (Some(student), _, _) => {
            ensure_visible(&state, &scope, student)?;
            state.academics.results_for_student(scope.tenant, student)
        }
        (None, Some(exam), _) => state.academics.results_for_exam(scope.tenant, exam),
        (None, None, Some(students)) => students
            .iter()
            .flat_map(|s| state.academics.results_for_student(scope.tenant, *s))
            .collect(),
        (None, None, None) => {
            return Err(TuitionError::invalid("student", "Filter by student or exam.").into());
        }
    };
    if let Some(exam) = query.exam {
        results.retain(|r| r.exam == exam);
    }
    if let Some(students) = &visible {
        results.retain(|r| students.contains(&r.student));
    }
    Ok(Json(ApiResponse::success(results)))
}
