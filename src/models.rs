use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::error::RecordError;

pub trait Entity {
    fn id(&self) -> &str;
}

/// A relationship field as the content API returns it: a bare id when the
/// query depth did not reach it, or the full document when it did.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Ref<T> {
    Unresolved(String),
    Resolved(T),
}

impl<T> Ref<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Ref::Resolved(doc) => Some(doc),
            Ref::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Ref::Resolved(_))
    }
}

impl<T: Entity> Ref<T> {
    pub fn id(&self) -> &str {
        match self {
            Ref::Unresolved(id) => id,
            Ref::Resolved(doc) => doc.id(),
        }
    }
}

impl<T> From<T> for Ref<T> {
    fn from(doc: T) -> Self {
        Ref::Resolved(doc)
    }
}

/// Populated documents this engine only needs the id of (users, progress targets).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EntityStub {
    pub id: String,
}

impl Entity for EntityStub {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    #[default]
    Sequential,
    Automatic,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Scorm,
    Video,
    Document,
    Survey,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn is_started(self) -> bool {
        !matches!(self, ProgressStatus::NotStarted)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EnrollmentSource {
    Direct,
    Bundle,
    LearningPath,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub access_type: AccessType,
    #[serde(default)]
    pub bundles: Vec<Ref<Bundle>>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<Ref<Module>>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub courses: Vec<Ref<Course>>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub duration_minutes: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sections: Vec<Ref<Section>>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub activities: Vec<Ref<Activity>>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub activity_type: ActivityType,
    pub scorm_package_url: Option<String>,
    pub video_url: Option<String>,
    pub document_url: Option<String>,
    pub survey: Option<Ref<EntityStub>>,
}

macro_rules! impl_entity {
    ($($ty:ty),*) => {
        $(impl Entity for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_entity!(LearningPath, Bundle, Module, Course, Section, Activity);

/// Granularity of a progress or enrollment document, named after the
/// relationship field that points at the tracked entity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RecordLevel {
    Activity,
    Section,
    Course,
    Bundle,
    LearningPath,
}

/// One progress document at any granularity. Documents often carry
/// back-references (an activity record naming its `course`), so the
/// finest relationship present becomes `target`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RawProgressRecord", into = "RawProgressRecord")]
pub struct ProgressRecord {
    pub id: Option<String>,
    pub user: Option<Ref<EntityStub>>,
    pub level: RecordLevel,
    pub target: Ref<EntityStub>,
    pub status: ProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn new(target: impl Into<String>, status: ProgressStatus) -> Self {
        Self {
            id: None,
            user: None,
            level: RecordLevel::Activity,
            target: Ref::Unresolved(target.into()),
            status,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn at(mut self, level: RecordLevel) -> Self {
        self.level = level;
        self
    }

    pub fn target_id(&self) -> &str {
        self.target.id()
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProgressRecord {
    id: Option<String>,
    user: Option<Ref<EntityStub>>,
    activity: Option<Ref<EntityStub>>,
    section: Option<Ref<EntityStub>>,
    course: Option<Ref<EntityStub>>,
    bundle: Option<Ref<EntityStub>>,
    learning_path: Option<Ref<EntityStub>>,
    #[serde(default)]
    status: ProgressStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawProgressRecord> for ProgressRecord {
    type Error = RecordError;

    fn try_from(raw: RawProgressRecord) -> Result<Self, Self::Error> {
        let (level, target) = [
            (RecordLevel::Activity, raw.activity),
            (RecordLevel::Section, raw.section),
            (RecordLevel::Course, raw.course),
            (RecordLevel::Bundle, raw.bundle),
            (RecordLevel::LearningPath, raw.learning_path),
        ]
        .into_iter()
        .find_map(|(level, target)| target.map(|t| (level, t)))
        .ok_or(RecordError::NoTarget("activity, section, course, bundle or learningPath"))?;
        Ok(Self {
            id: raw.id,
            user: raw.user,
            level,
            target,
            status: raw.status,
            started_at: raw.started_at,
            completed_at: raw.completed_at,
        })
    }
}

impl From<ProgressRecord> for RawProgressRecord {
    fn from(record: ProgressRecord) -> Self {
        let mut raw = Self {
            id: record.id,
            user: record.user,
            activity: None,
            section: None,
            course: None,
            bundle: None,
            learning_path: None,
            status: record.status,
            started_at: record.started_at,
            completed_at: record.completed_at,
        };
        let slot = match record.level {
            RecordLevel::Activity => &mut raw.activity,
            RecordLevel::Section => &mut raw.section,
            RecordLevel::Course => &mut raw.course,
            RecordLevel::Bundle => &mut raw.bundle,
            RecordLevel::LearningPath => &mut raw.learning_path,
        };
        *slot = Some(record.target);
        raw
    }
}

/// Course or bundle enrollment. A course enrollment granted through a
/// bundle names both; the course wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RawEnrollment", into = "RawEnrollment")]
pub struct Enrollment {
    pub id: Option<String>,
    pub user: Option<Ref<EntityStub>>,
    pub level: RecordLevel,
    pub target: Ref<EntityStub>,
    pub is_active: bool,
    pub enrollment_source: EnrollmentSource,
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn is_active_for_course(&self, course_id: &str) -> bool {
        self.is_active && self.level == RecordLevel::Course && self.target.id() == course_id
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnrollment {
    id: Option<String>,
    user: Option<Ref<EntityStub>>,
    course: Option<Ref<EntityStub>>,
    bundle: Option<Ref<EntityStub>>,
    #[serde(default = "default_true")]
    is_active: bool,
    enrollment_source: EnrollmentSource,
    enrolled_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawEnrollment> for Enrollment {
    type Error = RecordError;

    fn try_from(raw: RawEnrollment) -> Result<Self, Self::Error> {
        let (level, target) = match (raw.course, raw.bundle) {
            (Some(course), _) => (RecordLevel::Course, course),
            (None, Some(bundle)) => (RecordLevel::Bundle, bundle),
            (None, None) => return Err(RecordError::NoTarget("course or bundle")),
        };
        Ok(Self {
            id: raw.id,
            user: raw.user,
            level,
            target,
            is_active: raw.is_active,
            enrollment_source: raw.enrollment_source,
            enrolled_at: raw.enrolled_at,
        })
    }
}

impl From<Enrollment> for RawEnrollment {
    fn from(e: Enrollment) -> Self {
        let (course, bundle) = match e.level {
            RecordLevel::Bundle => (None, Some(e.target)),
            _ => (Some(e.target), None),
        };
        Self {
            id: e.id,
            user: e.user,
            course,
            bundle,
            is_active: e.is_active,
            enrollment_source: e.enrollment_source,
            enrolled_at: e.enrolled_at,
        }
    }
}

fn default_true() -> bool {
    true
}
