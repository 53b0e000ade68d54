use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::access::{self, LearningPathProgress};
use crate::enrollment;
use crate::models::{Course, Enrollment, EnrollmentSource, LearningPath, ProgressRecord, ProgressStatus};
use crate::progress::{self, ProgressReport};

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseCard {
    pub course_id: String,
    pub title: String,
    pub enrollment_source: Option<EnrollmentSource>,
    pub progress: ProgressReport,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub enrolled_courses: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub overall_percentage: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub courses: Vec<CourseCard>,
    pub learning_paths: Vec<LearningPathProgress>,
    pub totals: DashboardTotals,
}

/// Everything the dashboard needs, already fetched for one user.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInput {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub activity_progress: Vec<ProgressRecord>,
    #[serde(default)]
    pub learning_paths: Vec<LearningPath>,
    #[serde(default)]
    pub course_progress: Vec<ProgressRecord>,
}

/// Cards for actively enrolled courses (course order), path summaries, and
/// totals. Course completion comes from activity progress.
pub fn build_dashboard(input: &DashboardInput) -> Dashboard {
    let courses: Vec<CourseCard> = input
        .courses
        .iter()
        .filter(|course| enrollment::is_enrolled(&input.enrollments, &course.id))
        .map(|course| CourseCard {
            course_id: course.id.clone(),
            title: course.title.clone(),
            enrollment_source: enrollment::enrollment_source(&input.enrollments, &course.id),
            progress: progress::course_progress(course, &input.activity_progress),
        })
        .collect();

    let count = |wanted: ProgressStatus| {
        courses
            .iter()
            .filter(|card| card.progress.status == wanted)
            .count()
    };
    let completed_courses = count(ProgressStatus::Completed);
    let totals = DashboardTotals {
        enrolled_courses: courses.len(),
        completed_courses,
        in_progress_courses: count(ProgressStatus::InProgress),
        overall_percentage: progress::percentage(completed_courses, courses.len()),
    };

    let learning_paths = input
        .learning_paths
        .iter()
        .map(|path| access::learning_path_progress(path, &input.course_progress))
        .collect();

    Dashboard {
        courses,
        learning_paths,
        totals,
    }
}
