//! Extracting courses and assignments from Gradescope pages.
//!
//! Only the handful of elements the sync needs are read. Rows that can't be
//! tied to an assignment id are dropped with a warning; a row without a due
//! date is still returned, the reconciler decides what to do with it.

use super::models::{AssignmentRecord, Course};
use crate::error::{gradescope_error, SyncResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::warn;

fn selector(css: &str) -> SyncResult<Selector> {
    Selector::parse(css).map_err(|e| gradescope_error(&format!("Bad selector {}: {}", css, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The CSRF token the login form must echo back
pub fn parse_authenticity_token(html: &str) -> SyncResult<Option<String>> {
    let document = Html::parse_document(html);

    let input = selector(r#"input[name="authenticity_token"]"#)?;
    if let Some(value) = document
        .select(&input)
        .find_map(|el| el.value().attr("value"))
    {
        return Ok(Some(value.to_string()));
    }

    let meta = selector(r#"meta[name="csrf-token"]"#)?;
    Ok(document
        .select(&meta)
        .find_map(|el| el.value().attr("content"))
        .map(|v| v.to_string()))
}

/// Courses linked from the account page
pub fn parse_courses(html: &str) -> SyncResult<Vec<Course>> {
    let document = Html::parse_document(html);
    let course_box = selector("a.courseBox")?;
    let short_name = selector(".courseBox--shortname")?;
    let full_name = selector(".courseBox--name")?;

    let mut seen = HashSet::new();
    let mut courses = Vec::new();

    for link in document.select(&course_box) {
        let Some(id) = link.value().attr("href").and_then(course_id_from_href) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let name = link
            .select(&short_name)
            .next()
            .or_else(|| link.select(&full_name).next())
            .map(text_of)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Course {}", id));

        courses.push(Course { id, name });
    }

    Ok(courses)
}

/// Assignments in the student table of a course page
pub fn parse_assignments(course: &Course, html: &str) -> SyncResult<Vec<AssignmentRecord>> {
    let document = Html::parse_document(html);
    let row = selector("#assignments-student-table tbody tr")?;
    let primary = selector("th.table--primaryCell, td.table--primaryCell")?;
    let link = selector("a[href]")?;
    let submit_button = selector("[data-assignment-id]")?;
    let due = selector("time.submissionTimeChart--dueDate")?;

    let mut records = Vec::new();

    for tr in document.select(&row) {
        let Some(cell) = tr.select(&primary).next() else {
            continue;
        };

        let from_link = cell.select(&link).find_map(|a| {
            a.value()
                .attr("href")
                .and_then(assignment_id_from_href)
                .map(|id| (id, text_of(a)))
        });
        let from_button = || {
            cell.select(&submit_button).find_map(|b| {
                b.value()
                    .attr("data-assignment-id")
                    .map(|id| (id.trim().to_string(), text_of(b)))
            })
        };

        let Some((assignment_id, label)) = from_link.or_else(from_button) else {
            warn!(
                "Skipping row without assignment id in course {}: {}",
                course.id,
                text_of(cell)
            );
            continue;
        };

        let title = if label.is_empty() { text_of(cell) } else { label };

        let due_at = tr
            .select(&due)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        records.push(AssignmentRecord {
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            assignment_id,
            title,
            due_at,
        });
    }

    Ok(records)
}

/// `/courses/123` or `/courses/123/...` to `123`
fn course_id_from_href(href: &str) -> Option<String> {
    let mut parts = href.trim_start_matches('/').split('/');
    match (parts.next(), parts.next()) {
        (Some("courses"), Some(id)) if !id.is_empty() => Some(id.to_string()),
        _ => None,
    }
}

/// `/courses/1/assignments/55/submissions/9` to `55`
fn assignment_id_from_href(href: &str) -> Option<String> {
    let mut parts = href.split('/');
    parts.find(|p| *p == "assignments")?;
    parts
        .next()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_PAGE: &str = r##"
        <html><body>
          <div class="courseList">
            <div class="courseList--coursesForTerm">
              <a class="courseBox" href="/courses/101">
                <h3 class="courseBox--shortname">CS 101</h3>
                <div class="courseBox--name">Intro to Computing</div>
              </a>
              <a class="courseBox" href="/courses/202">
                <div class="courseBox--name">Linear   Algebra</div>
              </a>
              <a class="courseBox" href="/courses/101">
                <h3 class="courseBox--shortname">CS 101 again</h3>
              </a>
              <a class="courseBox courseBox--add" href="#">Add course</a>
            </div>
          </div>
        </body></html>
    "##;

    const COURSE_PAGE: &str = r#"
        <table id="assignments-student-table">
          <thead><tr><th>Name</th><th>Status</th><th>Released</th></tr></thead>
          <tbody>
            <tr>
              <th class="table--primaryCell" scope="row">
                <a href="/courses/101/assignments/5501/submissions/9001">HW1</a>
              </th>
              <td><div class="submissionStatus--text">Submitted</div></td>
              <td>
                <time class="submissionTimeChart--releaseDate" datetime="2026-01-10 09:00:00 -0800">Jan 10</time>
                <time class="submissionTimeChart--dueDate" datetime="2026-01-24 16:00:00 -0800">Jan 24 at 4:00PM</time>
              </td>
            </tr>
            <tr>
              <th class="table--primaryCell" scope="row">
                <button class="js-submitAssignment" data-assignment-id="5502" type="button">
                  Project   Proposal
                </button>
              </th>
              <td>No Submission</td>
              <td>
                <time class="submissionTimeChart--dueDate" datetime="2026-02-01 23:59:00 -0800">Feb 1</time>
              </td>
            </tr>
            <tr>
              <th class="table--primaryCell" scope="row">
                <button class="js-submitAssignment" data-assignment-id="5503" type="button">Reading Quiz</button>
              </th>
              <td>No Submission</td>
              <td></td>
            </tr>
            <tr>
              <th class="table--primaryCell" scope="row">Participation</th>
              <td></td><td></td>
            </tr>
          </tbody>
        </table>
    "#;

    fn course() -> Course {
        Course {
            id: "101".to_string(),
            name: "CS 101".to_string(),
        }
    }

    #[test]
    fn test_parse_courses() {
        let courses = parse_courses(ACCOUNT_PAGE).unwrap();
        assert_eq!(
            courses,
            vec![
                Course {
                    id: "101".to_string(),
                    name: "CS 101".to_string()
                },
                Course {
                    id: "202".to_string(),
                    name: "Linear Algebra".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_assignments() {
        let records = parse_assignments(&course(), COURSE_PAGE).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].assignment_id, "5501");
        assert_eq!(records[0].title, "HW1");
        assert_eq!(records[0].due_at.as_deref(), Some("2026-01-24 16:00:00 -0800"));
        assert_eq!(records[0].course_name, "CS 101");

        assert_eq!(records[1].assignment_id, "5502");
        assert_eq!(records[1].title, "Project Proposal");

        assert_eq!(records[2].assignment_id, "5503");
        assert_eq!(records[2].due_at, None);
    }

    #[test]
    fn test_parse_assignments_empty_page() {
        let records = parse_assignments(&course(), "<html><body>No assignments</body></html>").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_authenticity_token() {
        let form = r#"<form action="/login"><input type="hidden" name="authenticity_token" value="abc123=="></form>"#;
        assert_eq!(parse_authenticity_token(form).unwrap().as_deref(), Some("abc123=="));

        let meta = r#"<html><head><meta name="csrf-token" content="meta-token"></head></html>"#;
        assert_eq!(parse_authenticity_token(meta).unwrap().as_deref(), Some("meta-token"));

        assert_eq!(parse_authenticity_token("<html></html>").unwrap(), None);
    }

    #[test]
    fn test_href_helpers() {
        assert_eq!(course_id_from_href("/courses/42"), Some("42".to_string()));
        assert_eq!(course_id_from_href("/courses/42/assignments"), Some("42".to_string()));
        assert_eq!(course_id_from_href("#"), None);
        assert_eq!(
            assignment_id_from_href("/courses/1/assignments/55/submissions/9"),
            Some("55".to_string())
        );
        assert_eq!(assignment_id_from_href("/courses/1"), None);
    }
}
