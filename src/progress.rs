use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Bundle, Course, LearningPath, ProgressRecord, ProgressStatus, Section};
use crate::tree;

/// Progress records keyed by target id. Later records override earlier ones.
#[derive(Debug, Default)]
pub struct ProgressIndex<'a> {
    by_target: HashMap<&'a str, &'a ProgressRecord>,
}

impl<'a> ProgressIndex<'a> {
    pub fn new(records: &'a [ProgressRecord]) -> Self {
        let mut by_target = HashMap::with_capacity(records.len());
        for record in records {
            by_target.insert(record.target_id(), record);
        }
        Self { by_target }
    }

    pub fn get(&self, target_id: &str) -> Option<&'a ProgressRecord> {
        self.by_target.get(target_id).copied()
    }

    /// Missing record reads as not started.
    pub fn status(&self, target_id: &str) -> ProgressStatus {
        self.get(target_id)
            .map(|record| record.status)
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub completion_percentage: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    #[serde(flatten)]
    pub summary: ProgressSummary,
    pub status: ProgressStatus,
}

/// `round(part / total * 100)`, half rounding up; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total);
    ((part * 200 + total) / (total * 2)) as u8
}

pub fn aggregate<S: AsRef<str>>(child_ids: &[S], records: &[ProgressRecord]) -> ProgressSummary {
    aggregate_indexed(child_ids, &ProgressIndex::new(records))
}

pub fn aggregate_indexed<S: AsRef<str>>(child_ids: &[S], index: &ProgressIndex<'_>) -> ProgressSummary {
    let mut summary = ProgressSummary {
        total: child_ids.len(),
        ..ProgressSummary::default()
    };
    for id in child_ids {
        match index.status(id.as_ref()) {
            ProgressStatus::Completed => summary.completed += 1,
            ProgressStatus::InProgress => summary.in_progress += 1,
            ProgressStatus::NotStarted => summary.not_started += 1,
        }
    }
    summary.completion_percentage = percentage(summary.completed, summary.total);
    summary
}

/// Roll-up status of a parent.
///
/// An empty parent is never complete. Otherwise all children completed gives
/// `Completed`, any child started gives `InProgress`, else `NotStarted`.
pub fn resolve_status<S: AsRef<str>>(child_ids: &[S], records: &[ProgressRecord]) -> ProgressStatus {
    resolve_status_indexed(child_ids, &ProgressIndex::new(records))
}

pub fn resolve_status_indexed<S: AsRef<str>>(
    child_ids: &[S],
    index: &ProgressIndex<'_>,
) -> ProgressStatus {
    if child_ids.is_empty() {
        return ProgressStatus::NotStarted;
    }
    let statuses: Vec<ProgressStatus> = child_ids.iter().map(|id| index.status(id.as_ref())).collect();
    if statuses.iter().all(|s| *s == ProgressStatus::Completed) {
        ProgressStatus::Completed
    } else if statuses.iter().any(|s| s.is_started()) {
        ProgressStatus::InProgress
    } else {
        ProgressStatus::NotStarted
    }
}

pub fn report<S: AsRef<str>>(child_ids: &[S], records: &[ProgressRecord]) -> ProgressReport {
    let index = ProgressIndex::new(records);
    ProgressReport {
        summary: aggregate_indexed(child_ids, &index),
        status: resolve_status_indexed(child_ids, &index),
    }
}

pub fn section_progress(section: &Section, activity_records: &[ProgressRecord]) -> ProgressReport {
    report(&tree::section_activity_ids(section), activity_records)
}

pub fn course_progress(course: &Course, activity_records: &[ProgressRecord]) -> ProgressReport {
    let ids: Vec<&str> = tree::course_activities(course)
        .into_iter()
        .map(|activity| activity.id.as_str())
        .collect();
    report(&ids, activity_records)
}

pub fn bundle_progress(bundle: &Bundle, course_records: &[ProgressRecord]) -> ProgressReport {
    report(&tree::bundle_course_ids(bundle), course_records)
}

pub fn learning_path_progress(path: &LearningPath, course_records: &[ProgressRecord]) -> ProgressReport {
    report(&tree::learning_path_course_ids(path), course_records)
}
