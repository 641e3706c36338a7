//! Role capabilities
//!
//! One table decides what each role may do. Ownership (a student only sees
//! their own bills) is layered on top by the caller.

use crate::model::Role;
use serde::{Deserialize, Serialize};

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    // Platform
    ManageTenants,

    // People
    ViewPeople,
    ManagePeople,

    // Academics
    ViewAcademics,
    ManageAcademics,
    MarkAttendance,
    ViewAttendance,
    ManageExams,
    RecordResults,
    ViewResults,

    // Billing
    ViewFees,
    ManageFees,
    RecordPayment,
    PayOnline,
    ViewDueList,
    ViewCollections,
    DownloadReceipt,

    // Misc
    ViewDashboard,
}

use Operation::*;

const ADMIN_OPERATIONS: &[Operation] = &[
    ViewPeople, ManagePeople,
    ViewAcademics, ManageAcademics, MarkAttendance, ViewAttendance,
    ManageExams, RecordResults, ViewResults,
    ViewFees, ManageFees, RecordPayment, PayOnline,
    ViewDueList, ViewCollections, DownloadReceipt,
    ViewDashboard,
];

const TEACHER_OPERATIONS: &[Operation] = &[
    ViewPeople,
    ViewAcademics, MarkAttendance, ViewAttendance,
    ManageExams, RecordResults, ViewResults,
    ViewDashboard,
];

const STUDENT_OPERATIONS: &[Operation] = &[
    ViewAcademics, ViewAttendance, ViewResults,
    ViewFees, PayOnline, DownloadReceipt,
    ViewDashboard,
];

const PARENT_OPERATIONS: &[Operation] = &[
    ViewAttendance, ViewResults,
    ViewFees, PayOnline, DownloadReceipt,
    ViewDashboard,
];

/// Role → allowed operations. Owner is handled separately: it may do
/// everything.
const CAPABILITIES: &[(Role, &[Operation])] = &[
    (Role::InstituteAdmin, ADMIN_OPERATIONS),
    (Role::Teacher, TEACHER_OPERATIONS),
    (Role::Student, STUDENT_OPERATIONS),
    (Role::Parent, PARENT_OPERATIONS),
];

/// Whether `role` may perform `operation`
pub fn can(role: Role, operation: Operation) -> bool {
    if role == Role::Owner {
        return true;
    }
    CAPABILITIES
        .iter()
        .find(|(r, _)| *r == role)
        .map_or(false, |(_, ops)| ops.contains(&operation))
}

/// Operations allowed for a role, for introspection endpoints
pub fn operations_for(role: Role) -> Vec<Operation> {
    const EVERYTHING: &[Operation] = &[
        ManageTenants, ViewPeople, ManagePeople,
        ViewAcademics, ManageAcademics, MarkAttendance, ViewAttendance,
        ManageExams, RecordResults, ViewResults,
        ViewFees, ManageFees, RecordPayment, PayOnline,
        ViewDueList, ViewCollections, DownloadReceipt, ViewDashboard,
    ];
    EVERYTHING.iter().copied().filter(|op| can(role, *op)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_can_everything() {
        assert!(can(Role::Owner, ManageTenants));
        assert_eq!(operations_for(Role::Owner).len(), 18);
    }

    #[test]
    fn test_admin_cannot_manage_tenants() {
        assert!(!can(Role::InstituteAdmin, ManageTenants));
        assert!(can(Role::InstituteAdmin, ViewDueList));
        assert!(can(Role::InstituteAdmin, RecordPayment));
    }

    #[test]
    fn test_due_list_is_admin_only() {
        for role in [Role::Teacher, Role::Student, Role::Parent] {
            assert!(!can(role, ViewDueList), "{} should not see the due list", role);
        }
    }

    #[test]
    fn test_payers() {
        assert!(can(Role::Student, PayOnline));
        assert!(can(Role::Parent, PayOnline));
        assert!(!can(Role::Student, RecordPayment));
        assert!(!can(Role::Teacher, ManageFees));
    }

    #[test]
    fn test_teacher_academics() {
        assert!(can(Role::Teacher, MarkAttendance));
        assert!(!can(Role::Teacher, ManageAcademics));
        assert!(!can(Role::Parent, MarkAttendance));
    }
}
