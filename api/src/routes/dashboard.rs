//! Role-specific landing page

use crate::error::ApiResult;
use crate::middleware::permissions::require;
use crate::middleware::tenant::TenantScope;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tuition_academics::{AttendanceSummary, Batch, Exam, StudentProfile, StudentResult};
use tuition_billing::{CollectionSummary, StudentBalance};
use tuition_tenant::{Operation, Role, Tenant};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/dashboard", get(dashboard))
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Admin {
        institute: Option<Tenant>,
        students: usize,
        teachers: usize,
        batches: usize,
        today: CollectionSummary,
        due_installments: usize,
    },
    Teacher {
        batches: Vec<Batch>,
        students: usize,
        exams: Vec<Exam>,
    },
    Student {
        profile: Option<StudentProfile>,
        attendance: Option<AttendanceSummary>,
        balance: StudentBalance,
        results: Vec<StudentResult>,
    },
    Parent {
        children: Vec<ChildOverview>,
    },
}

#[derive(Debug, Serialize)]
pub struct ChildOverview {
    pub profile: StudentProfile,
    pub attendance: AttendanceSummary,
    pub balance: StudentBalance,
}

pub async fn dashboard(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Dashboard>>> {
    require(&scope.user, Operation::ViewDashboard)?;
    let tenant = scope.tenant;
    let academics = &state.academics;

    let view = match scope.user.role {
        Role::Owner | Role::InstituteAdmin => {
            let today = Utc::now().date_naive();
            Dashboard::Admin {
                institute: state.directory.get(tenant),
                students: academics.list_students(tenant).len(),
                teachers: state.identity.list(tenant, Some(Role::Teacher)).len(),
                batches: academics.list_batches(tenant).len(),
                today: state.billing.collection_summary(tenant, today).await?,
                due_installments: state.billing.due_list(tenant, today).await?.len(),
            }
        }
        Role::Teacher => {
            let batches = academics.batches_for_teacher(tenant, scope.user.id);
            let students = batches
                .iter()
                .map(|b| academics.students_in_batch(tenant, b.id).len())
                .sum();
            let exams = academics
                .list_exams(tenant)
                .into_iter()
                .filter(|e| batches.iter().any(|b| b.id == e.batch))
                .collect();
            Dashboard::Teacher { batches, students, exams }
        }
        Role::Student => {
            let profile = academics.profile_for_person(tenant, scope.user.id);
            let students: Vec<_> = profile.iter().map(|p| p.id).collect();
            let results = students
                .iter()
                .flat_map(|s| academics.results_for_student(tenant, *s))
                .collect();
            Dashboard::Student {
                attendance: profile.as_ref().map(|p| academics.attendance_summary(tenant, p.id)),
                balance: state.billing.student_balance(tenant, &students).await?,
                profile,
                results,
            }
        }
        Role::Parent => {
            let mut children = Vec::new();
            for profile in academics.children_of(tenant, scope.user.id) {
                children.push(ChildOverview {
                    attendance: academics.attendance_summary(tenant, profile.id),
                    balance: state.billing.student_balance(tenant, &[profile.id]).await?,
                    profile,
                });
            }
            Dashboard::Parent { children }
        }
    };
    Ok(Json(ApiResponse::success(view)))
}
