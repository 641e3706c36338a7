//! Academic Registry
//!
//! Subjects, batches, student profiles, parent links, attendance and exam
//! results. Every table lives inside the institute's partition.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ACADEMIC REGISTRY                    │
//! │  Subject ◄──► Batch ◄──► Teacher                        │
//! │                 │                                       │
//! │                 ▼                                       │
//! │           StudentProfile ◄──► Parent                    │
//! │             │        │                                  │
//! │             ▼        ▼                                  │
//! │   Attendance        StudentResult ──► Exam              │
//! │ (student,batch,date) (student,exam,subject)             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod attendance;
pub mod exams;
pub mod model;
pub mod registry;

pub use model::*;
pub use registry::AcademicRegistry;
