use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::models::{AccessType, LearningPath, ProgressRecord, ProgressStatus};
use crate::progress::{self, ProgressIndex};
use crate::tree;

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SequentialState {
    pub access_type: AccessType,
    pub unlocked_course_ids: Vec<String>,
    pub locked_course_ids: Vec<String>,
    pub completed_course_ids: Vec<String>,
    pub current_course_id: Option<String>,
    pub next_course_id: Option<String>,
    pub total_courses: usize,
    pub completion_percentage: u8,
    pub status: ProgressStatus,
}

/// Access snapshot for `course_ids` (depth-first path order).
///
/// Sequential paths are resolved in one forward pass. A course that is not
/// started unlocks only when it is first or its immediate predecessor is
/// completed; started courses are always unlocked.
pub fn sequential_state<S: AsRef<str>>(
    access_type: AccessType,
    course_ids: &[S],
    records: &[ProgressRecord],
) -> SequentialState {
    let index = ProgressIndex::new(records);
    let completed: Vec<String> = course_ids
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| index.status(id) == ProgressStatus::Completed)
        .map(str::to_owned)
        .collect();

    let mut state = SequentialState {
        access_type,
        unlocked_course_ids: Vec::new(),
        locked_course_ids: Vec::new(),
        completion_percentage: progress::percentage(completed.len(), course_ids.len()),
        status: progress::resolve_status_indexed(course_ids, &index),
        completed_course_ids: completed,
        current_course_id: None,
        next_course_id: None,
        total_courses: course_ids.len(),
    };

    if access_type == AccessType::Automatic {
        state.unlocked_course_ids = course_ids.iter().map(|id| id.as_ref().to_owned()).collect();
        return state;
    }

    for (i, id) in course_ids.iter().map(AsRef::as_ref).enumerate() {
        match index.status(id) {
            ProgressStatus::Completed => state.unlocked_course_ids.push(id.to_owned()),
            ProgressStatus::InProgress => {
                state.current_course_id = Some(id.to_owned());
                state.unlocked_course_ids.push(id.to_owned());
            }
            ProgressStatus::NotStarted => {
                let predecessor_done = i == 0
                    || index.status(course_ids[i - 1].as_ref()) == ProgressStatus::Completed;
                if predecessor_done {
                    state.unlocked_course_ids.push(id.to_owned());
                    state.current_course_id.get_or_insert_with(|| id.to_owned());
                    state.next_course_id.get_or_insert_with(|| id.to_owned());
                } else {
                    tracing::debug!(course_id = id, "course locked behind incomplete predecessor");
                    state.locked_course_ids.push(id.to_owned());
                }
            }
        }
    }
    state
}

pub fn learning_path_state(path: &LearningPath, course_records: &[ProgressRecord]) -> SequentialState {
    let ids = tree::learning_path_course_ids(path);
    sequential_state(path.access_type, &ids, course_records)
}

pub fn is_accessible_in_sequence(course_id: &str, state: &SequentialState) -> bool {
    match state.access_type {
        AccessType::Automatic => true,
        AccessType::Sequential => state.unlocked_course_ids.iter().any(|id| id == course_id),
    }
}

/// First in-progress course, else first course not started, else `None`.
pub fn find_current_course<S: AsRef<str>>(course_ids: &[S], records: &[ProgressRecord]) -> Option<String> {
    let index = ProgressIndex::new(records);
    let first_with = |wanted: ProgressStatus| {
        course_ids
            .iter()
            .map(AsRef::as_ref)
            .find(|id| index.status(id) == wanted)
            .map(str::to_owned)
    };
    first_with(ProgressStatus::InProgress).or_else(|| first_with(ProgressStatus::NotStarted))
}

pub fn find_next_course<S: AsRef<str>>(course_ids: &[S], records: &[ProgressRecord]) -> Option<String> {
    let index = ProgressIndex::new(records);
    course_ids
        .iter()
        .map(AsRef::as_ref)
        .find(|id| index.status(id) != ProgressStatus::Completed)
        .map(str::to_owned)
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathProgress {
    pub learning_path_id: String,
    pub total_courses: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub completion_percentage: u8,
    pub status: ProgressStatus,
    pub current_course_id: Option<String>,
    pub next_course_id: Option<String>,
}

pub fn learning_path_progress(path: &LearningPath, course_records: &[ProgressRecord]) -> LearningPathProgress {
    let ids = tree::learning_path_course_ids(path);
    let report = progress::report(&ids, course_records);
    LearningPathProgress {
        learning_path_id: path.id.clone(),
        total_courses: report.summary.total,
        completed_courses: report.summary.completed,
        in_progress_courses: report.summary.in_progress,
        completion_percentage: report.summary.completion_percentage,
        status: report.status,
        current_course_id: find_current_course(&ids, course_records),
        next_course_id: find_next_course(&ids, course_records),
    }
}
