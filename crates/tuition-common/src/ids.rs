//! Entity identifiers
//!
//! Every entity gets its own UUID newtype so a `StudentId` can never be
//! passed where an `InstallmentId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Short human-facing reference, e.g. for receipt numbers
            pub fn short(&self) -> String {
                let simple = self.0.simple().to_string();
                format!("{}-{}", $prefix, simple[..8].to_uppercase())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Institute (tenant) id
    TenantId, "TEN"
);
entity_id!(
    /// Person (user login) id
    PersonId, "USR"
);
entity_id!(
    /// Subject id
    SubjectId, "SUB"
);
entity_id!(
    /// Batch id
    BatchId, "BAT"
);
entity_id!(
    /// Student profile id
    StudentId, "STU"
);
entity_id!(
    /// Attendance record id
    AttendanceId, "ATT"
);
entity_id!(
    /// Exam id
    ExamId, "EXM"
);
entity_id!(
    /// Exam result id
    ResultId, "RES"
);
entity_id!(
    /// Fee structure id
    FeeStructureId, "FEE"
);
entity_id!(
    /// Fee allocation id
    AllocationId, "ALC"
);
entity_id!(
    /// Installment (bill) id
    InstallmentId, "INS"
);
entity_id!(
    /// Payment (receipt) id
    PaymentId, "RCPT"
);
