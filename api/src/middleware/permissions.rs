//! Role checks and ownership scoping

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::tenant::TenantScope;
use crate::ApiState;
use tuition_common::StudentId;
use tuition_tenant::{can, Operation, Role};

/// Refuse unless the caller's role allows `operation`
pub fn require(user: &AuthUser, operation: Operation) -> ApiResult<()> {
    if can(user.role, operation) {
        Ok(())
    } else {
        tracing::debug!(user = %user.id, role = %user.role, ?operation, "operation refused");
        Err(ApiError::forbidden())
    }
}

/// Refuse unless the caller's role allows at least one of `operations`
pub fn require_any(user: &AuthUser, operations: &[Operation]) -> ApiResult<()> {
    if operations.iter().any(|op| can(user.role, *op)) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

/// Students whose rows the caller may see. `None` means all of them.
pub fn visible_students(state: &ApiState, scope: &TenantScope) -> Option<Vec<StudentId>> {
    match scope.user.role {
        Role::Owner | Role::InstituteAdmin | Role::Teacher => None,
        Role::Student => Some(
            state
                .academics
                .profile_for_person(scope.tenant, scope.user.id)
                .map(|profile| vec![profile.id])
                .unwrap_or_default(),
        ),
        Role::Parent => Some(
            state
                .academics
                .children_of(scope.tenant, scope.user.id)
                .into_iter()
                .map(|profile| profile.id)
                .collect(),
        ),
    }
}

/// Refuse unless the caller may see rows of `student`
pub fn ensure_visible(state: &ApiState, scope: &TenantScope, student: StudentId) -> ApiResult<()> {
    match visible_students(state, scope) {
        Some(students) if !students.contains(&student) => Err(ApiError::forbidden()),
        _ => Ok(()),
    }
}
