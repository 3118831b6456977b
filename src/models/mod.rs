//! Data transfer objects mirrored from the Nova API.
//!
//! These are opaque shapes owned by the remote backend; the client keeps
//! no invariants beyond what serde enforces at parse time.

pub mod dicom;
pub mod user;

pub use dicom::{Analysis, DicomInfo, DicomPage, DicomSortColumn, DicomStatus, ReviewState};
pub use user::{Role, UserInfo, UserPage, UserSortColumn};
