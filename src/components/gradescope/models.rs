use serde::{Deserialize, Serialize};

/// A course listed on the Gradescope account page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
}

/// One assignment as scraped, before any interpretation.
///
/// `due_at` is kept as the raw attribute text so a malformed value can be
/// reported against this single record instead of failing the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssignmentRecord {
    pub course_id: String,
    pub course_name: String,
    pub assignment_id: String,
    pub title: String,
    pub due_at: Option<String>,
}

/// A course whose assignment page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCourse {
    pub course: Course,
    pub reason: String,
}

/// Everything one fetch produced
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<AssignmentRecord>,
    pub failed_courses: Vec<FailedCourse>,
}
