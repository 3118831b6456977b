pub mod dashboard;
pub mod dicoms;
pub mod users;
