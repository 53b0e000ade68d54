use std::collections::HashSet;

use crate::models::{Enrollment, EnrollmentSource, RecordLevel};

/// Ids of courses with an active course-level enrollment, first occurrence order.
pub fn active_course_ids(enrollments: &[Enrollment]) -> Vec<String> {
    let mut seen = HashSet::new();
    enrollments
        .iter()
        .filter(|e| e.is_active && e.level == RecordLevel::Course)
        .map(|e| e.target.id())
        .filter(|id| seen.insert(*id))
        .map(str::to_owned)
        .collect()
}

pub fn is_enrolled(enrollments: &[Enrollment], course_id: &str) -> bool {
    enrollments
        .iter()
        .any(|e| e.is_active_for_course(course_id))
}

/// Source of the active enrollment for a course; the last one wins.
pub fn enrollment_source(enrollments: &[Enrollment], course_id: &str) -> Option<EnrollmentSource> {
    enrollments
        .iter()
        .rev()
        .find(|e| e.is_active_for_course(course_id))
        .map(|e| e.enrollment_source)
}
