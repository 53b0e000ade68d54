use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::error::CompletionError;
use crate::models::{ActivityType, ProgressRecord, ProgressStatus};
use crate::scorm::CompletionData;

/// Watched share at which a video counts as completed.
pub const VIDEO_COMPLETION_THRESHOLD: f64 = 90.0;

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoCompletion {
    pub watched_percentage: Option<f64>,
    pub position_seconds: Option<f64>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCompletion {
    #[serde(default)]
    pub viewed: bool,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCompletion {
    pub response_id: Option<String>,
    #[serde(default)]
    pub submitted: bool,
}

/// What a player reports when a learner finishes (or leaves) an activity.
/// Exactly one of the type-specific fields is expected.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub scorm_data: Option<CompletionData>,
    pub video: Option<VideoCompletion>,
    pub document: Option<DocumentCompletion>,
    pub survey: Option<SurveyCompletion>,
}

pub fn infer_activity_type(payload: &CompletionPayload) -> Result<ActivityType, CompletionError> {
    let mut found = Vec::new();
    if payload.scorm_data.is_some() {
        found.push(ActivityType::Scorm);
    }
    if payload.video.is_some() {
        found.push(ActivityType::Video);
    }
    if payload.document.is_some() {
        found.push(ActivityType::Document);
    }
    if payload.survey.is_some() {
        found.push(ActivityType::Survey);
    }
    match found.as_slice() {
        [] => Err(CompletionError::Missing),
        [only] => Ok(*only),
        _ => Err(CompletionError::Ambiguous(found)),
    }
}

/// Status the payload asks for, checked against the activity's declared type.
pub fn requested_status(
    declared: Option<ActivityType>,
    payload: &CompletionPayload,
) -> Result<ProgressStatus, CompletionError> {
    let found = infer_activity_type(payload)?;
    if let Some(declared) = declared {
        if declared != found {
            return Err(CompletionError::Mismatch { declared, found });
        }
    }
    let finished = match found {
        ActivityType::Scorm => payload
            .scorm_data
            .as_ref()
            .is_some_and(|d| d.completion_status == "completed" || d.success_status == "passed"),
        ActivityType::Video => payload.video.as_ref().is_some_and(|v| {
            v.completed || v.watched_percentage.unwrap_or(0.0) >= VIDEO_COMPLETION_THRESHOLD
        }),
        ActivityType::Document => payload.document.as_ref().is_some_and(|d| d.viewed),
        ActivityType::Survey => payload.survey.as_ref().is_some_and(|s| s.submitted),
    };
    Ok(if finished {
        ProgressStatus::Completed
    } else {
        ProgressStatus::InProgress
    })
}

/// Fields the caller should write to the activity's progress record.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDecision {
    pub status: ProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Transition from `current` towards `requested`. Completion is sticky;
/// `None` means nothing needs persisting.
pub fn decide_transition(
    current: Option<&ProgressRecord>,
    requested: ProgressStatus,
    now: DateTime<Utc>,
) -> Option<ProgressDecision> {
    let status = current.map(|r| r.status).unwrap_or_default();
    let next = match (status, requested) {
        (ProgressStatus::Completed, _) => return None,
        (from, to) if from == to => return None,
        (ProgressStatus::InProgress, ProgressStatus::NotStarted) => return None,
        (_, to) => to,
    };
    let started_at = match current.and_then(|r| r.started_at) {
        Some(_) => None,
        None => Some(now),
    };
    tracing::debug!(from = ?status, to = ?next, "progress transition");
    Some(ProgressDecision {
        status: next,
        started_at,
        completed_at: (next == ProgressStatus::Completed).then_some(now),
    })
}

pub fn decide_activity_progress(
    declared: Option<ActivityType>,
    current: Option<&ProgressRecord>,
    payload: &CompletionPayload,
    now: DateTime<Utc>,
) -> Result<Option<ProgressDecision>, CompletionError> {
    let requested = requested_status(declared, payload)?;
    Ok(decide_transition(current, requested, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn scorm(completion: &str, success: &str) -> CompletionPayload {
        CompletionPayload {
            scorm_data: Some(CompletionData {
                completion_status: completion.into(),
                success_status: success.into(),
                ..CompletionData::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn infers_the_single_shape() {
        assert_eq!(infer_activity_type(&scorm("completed", "unknown")), Ok(ActivityType::Scorm));
        let doc = CompletionPayload {
            document: Some(DocumentCompletion { viewed: true }),
            ..Default::default()
        };
        assert_eq!(infer_activity_type(&doc), Ok(ActivityType::Document));
    }

    #[test]
    fn rejects_empty_and_ambiguous_payloads() {
        assert_eq!(
            infer_activity_type(&CompletionPayload::default()),
            Err(CompletionError::Missing)
        );
        let mut both = scorm("completed", "passed");
        both.video = Some(VideoCompletion::default());
        assert_eq!(
            infer_activity_type(&both),
            Err(CompletionError::Ambiguous(vec![ActivityType::Scorm, ActivityType::Video]))
        );
    }

    #[test]
    fn declared_type_must_match_payload() {
        let err = requested_status(Some(ActivityType::Video), &scorm("completed", "passed"));
        assert_eq!(
            err,
            Err(CompletionError::Mismatch {
                declared: ActivityType::Video,
                found: ActivityType::Scorm
            })
        );
    }

    #[test]
    fn per_type_completion_rules() {
        assert_eq!(requested_status(None, &scorm("incomplete", "passed")), Ok(ProgressStatus::Completed));
        assert_eq!(requested_status(None, &scorm("incomplete", "unknown")), Ok(ProgressStatus::InProgress));
        let video = |pct| CompletionPayload {
            video: Some(VideoCompletion {
                watched_percentage: Some(pct),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(requested_status(None, &video(90.0)), Ok(ProgressStatus::Completed));
        assert_eq!(requested_status(None, &video(42.0)), Ok(ProgressStatus::InProgress));
        let survey = CompletionPayload {
            survey: Some(SurveyCompletion {
                response_id: Some("r1".into()),
                submitted: true,
            }),
            ..Default::default()
        };
        assert_eq!(requested_status(None, &survey), Ok(ProgressStatus::Completed));
    }

    #[test]
    fn first_completion_stamps_both_timestamps() {
        let d = decide_transition(None, ProgressStatus::Completed, now()).unwrap();
        assert_eq!(d.status, ProgressStatus::Completed);
        assert_eq!(d.started_at, Some(now()));
        assert_eq!(d.completed_at, Some(now()));
    }

    #[test]
    fn started_record_keeps_its_start_time() {
        let mut current = ProgressRecord::new("a1", ProgressStatus::InProgress);
        current.started_at = Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        let d = decide_transition(Some(&current), ProgressStatus::Completed, now()).unwrap();
        assert_eq!(d.started_at, None);
        assert_eq!(d.completed_at, Some(now()));
    }

    #[test]
    fn completion_never_regresses() {
        let current = ProgressRecord::new("a1", ProgressStatus::Completed);
        assert!(decide_transition(Some(&current), ProgressStatus::InProgress, now()).is_none());
        let in_progress = ProgressRecord::new("a1", ProgressStatus::InProgress);
        assert!(decide_transition(Some(&in_progress), ProgressStatus::InProgress, now()).is_none());
        assert!(decide_transition(Some(&in_progress), ProgressStatus::NotStarted, now()).is_none());
    }

    #[test]
    fn decide_activity_progress_propagates_inference_errors() {
        let res = decide_activity_progress(None, None, &CompletionPayload::default(), now());
        assert_eq!(res, Err(CompletionError::Missing));
        let ok = decide_activity_progress(Some(ActivityType::Scorm), None, &scorm("completed", "unknown"), now())
            .unwrap()
            .unwrap();
        assert_eq!(ok.status, ProgressStatus::Completed);
    }
}
