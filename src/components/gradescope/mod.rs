mod client;
pub mod models;
pub mod parser;

pub use client::GradescopeClient;
pub use models::{AssignmentRecord, Course, FailedCourse, FetchOutcome};
