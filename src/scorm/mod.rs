pub mod api;
pub mod elements;
pub mod manifest;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

pub use api::{Scorm12Api, Scorm2004Api};
pub use manifest::ScormPackage;

pub const TRUE: &str = "true";
pub const FALSE: &str = "false";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScormVersion {
    #[default]
    #[serde(rename = "1.2")]
    Scorm12,
    #[serde(rename = "2004")]
    Scorm2004,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Uninitialized,
    Initialized,
    Terminated,
}

/// Normalised outcome handed to the completion callback on terminate.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionData {
    pub completion_status: String,
    pub success_status: String,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub suspend_data: Option<String>,
}

pub type CompletionCallback = Box<dyn FnMut(&CompletionData) + Send>;

pub struct ScormRuntime {
    version: ScormVersion,
    state: RuntimeState,
    data: HashMap<String, String>,
    last_error: &'static str,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for ScormRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScormRuntime")
            .field("version", &self.version)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl ScormRuntime {
    pub fn new(version: ScormVersion) -> Self {
        let data = elements::defaults(version)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            version,
            state: RuntimeState::Uninitialized,
            data,
            last_error: elements::NO_ERROR,
            on_complete: None,
        }
    }

    pub fn with_completion_callback(
        mut self,
        callback: impl FnMut(&CompletionData) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn version(&self) -> ScormVersion {
        self.version
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn scorm12(&mut self) -> Scorm12Api<'_> {
        Scorm12Api::new(self)
    }

    pub fn scorm2004(&mut self) -> Scorm2004Api<'_> {
        Scorm2004Api::new(self)
    }

    fn ok(&mut self) -> &'static str {
        self.last_error = elements::NO_ERROR;
        TRUE
    }

    fn fail(&mut self, code: &'static str) -> &'static str {
        tracing::warn!(version = ?self.version, state = ?self.state, code, "scorm call rejected");
        self.last_error = code;
        FALSE
    }

    pub fn initialize(&mut self) -> &'static str {
        if self.state != RuntimeState::Uninitialized {
            return self.fail(elements::GENERAL_EXCEPTION);
        }
        self.state = RuntimeState::Initialized;
        tracing::debug!(version = ?self.version, "scorm session initialized");
        self.ok()
    }

    pub fn terminate(&mut self) -> &'static str {
        match self.state {
            RuntimeState::Uninitialized => return self.fail(elements::NOT_INITIALIZED),
            RuntimeState::Terminated => return self.fail(elements::GENERAL_EXCEPTION),
            RuntimeState::Initialized => {}
        }
        self.state = RuntimeState::Terminated;
        let data = self.completion_data();
        tracing::debug!(completion = %data.completion_status, success = %data.success_status, "scorm session terminated");
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&data);
        }
        self.ok()
    }

    /// Checks shared by the data-model calls. `Err` carries the error code.
    fn check_element(&self, element: &str) -> Result<(), &'static str> {
        if self.state != RuntimeState::Initialized {
            return Err(elements::NOT_INITIALIZED);
        }
        if !elements::is_accepted_element(element) {
            return Err(elements::NOT_IMPLEMENTED);
        }
        Ok(())
    }

    pub fn get_value(&mut self, element: &str) -> String {
        if let Err(code) = self.check_element(element) {
            self.fail(code);
            return String::new();
        }
        self.last_error = elements::NO_ERROR;
        self.data.get(element).cloned().unwrap_or_default()
    }

    pub fn set_value(&mut self, element: &str, value: &str) -> &'static str {
        if let Err(code) = self.check_element(element) {
            return self.fail(code);
        }
        self.data.insert(element.to_string(), value.to_string());
        self.ok()
    }

    pub fn commit(&mut self) -> &'static str {
        if self.state != RuntimeState::Initialized {
            return self.fail(elements::NOT_INITIALIZED);
        }
        self.ok()
    }

    pub fn last_error(&self) -> &'static str {
        self.last_error
    }

    pub fn error_string(&self, code: &str) -> &'static str {
        elements::error_string(code)
    }

    pub fn diagnostic(&self, code: &str) -> &'static str {
        elements::error_string(code)
    }

    /// Snapshot of the data store in normalised form.
    pub fn completion_data(&self) -> CompletionData {
        let keys = elements::keys(self.version);
        let read = |key: &str| self.data.get(key).map(String::as_str).unwrap_or_default();
        let (completion_status, success_status) = match self.version {
            ScormVersion::Scorm12 => {
                let lesson = read(keys.completion);
                (
                    elements::completion_from_lesson_status(lesson).to_string(),
                    elements::success_from_lesson_status(lesson).to_string(),
                )
            }
            ScormVersion::Scorm2004 => (
                read(keys.completion).to_string(),
                keys.success.map(read).unwrap_or_default().to_string(),
            ),
        };
        CompletionData {
            completion_status,
            success_status,
            score: parse_score(read(keys.score_raw)),
            max_score: parse_score(read(keys.score_max)),
            suspend_data: self.data.get(keys.suspend_data).cloned(),
        }
    }
}

fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn started(version: ScormVersion) -> ScormRuntime {
        let mut rt = ScormRuntime::new(version);
        assert_eq!(rt.initialize(), TRUE);
        rt
    }

    #[test]
    fn initialize_twice_is_a_general_exception() {
        let mut rt = started(ScormVersion::Scorm12);
        assert_eq!(rt.last_error(), "0");
        assert_eq!(rt.initialize(), FALSE);
        assert_eq!(rt.last_error(), "101");
    }

    #[test]
    fn termination_is_final() {
        let mut rt = started(ScormVersion::Scorm2004);
        assert_eq!(rt.terminate(), TRUE);
        assert_eq!(rt.state(), RuntimeState::Terminated);
        assert_eq!(rt.initialize(), FALSE);
        assert_eq!(rt.last_error(), "101");
        assert_eq!(rt.terminate(), FALSE);
        assert_eq!(rt.last_error(), "101");
        assert_eq!(rt.get_value("cmi.completion_status"), "");
        assert_eq!(rt.last_error(), "301");
    }

    #[test]
    fn calls_before_initialize_report_not_initialized() {
        let mut rt = ScormRuntime::new(ScormVersion::Scorm12);
        assert_eq!(rt.get_value("cmi.core.lesson_status"), "");
        assert_eq!(rt.last_error(), "301");
        assert_eq!(rt.set_value("cmi.core.lesson_status", "passed"), FALSE);
        assert_eq!(rt.last_error(), "301");
        assert_eq!(rt.commit(), FALSE);
        assert_eq!(rt.terminate(), FALSE);
        assert_eq!(rt.last_error(), "301");
        // invalid key still reports the initialization problem first
        assert_eq!(rt.set_value("invalid.key", "x"), FALSE);
        assert_eq!(rt.last_error(), "301");
    }

    #[test]
    fn unknown_namespaces_are_not_implemented() {
        let mut rt = started(ScormVersion::Scorm12);
        assert_eq!(rt.set_value("invalid.key", "x"), FALSE);
        assert_eq!(rt.last_error(), "401");
        assert_eq!(rt.get_value("invalid.key"), "");
        assert_eq!(rt.last_error(), "401");
    }

    #[test]
    fn seeded_defaults_and_unset_keys() {
        let mut rt = started(ScormVersion::Scorm12);
        assert_eq!(rt.get_value("cmi.core.lesson_status"), "not attempted");
        assert_eq!(rt.get_value("cmi.core.score.max"), "100");
        assert_eq!(rt.get_value("cmi.core.lesson_location"), "");
        assert_eq!(rt.last_error(), "0");

        let mut rt = started(ScormVersion::Scorm2004);
        assert_eq!(rt.get_value("cmi.success_status"), "unknown");
        assert_eq!(rt.get_value("cmi.score.min"), "0");
    }

    #[test]
    fn commit_is_accepted_once_initialized() {
        let mut rt = started(ScormVersion::Scorm2004);
        rt.set_value("cmi.location", "page-3");
        assert_eq!(rt.commit(), TRUE);
        assert_eq!(rt.get_value("cmi.location"), "page-3");
    }

    #[test]
    fn terminate_hands_mapped_data_to_callback() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let mut rt = ScormRuntime::new(ScormVersion::Scorm12)
            .with_completion_callback(move |d| *sink.lock().unwrap() = Some(d.clone()));
        rt.initialize();
        rt.set_value("cmi.core.lesson_status", "passed");
        rt.set_value("cmi.core.score.raw", "87.5");
        rt.set_value("cmi.suspend_data", "bookmark=4");
        assert_eq!(rt.terminate(), TRUE);

        let data = seen.lock().unwrap().clone().unwrap();
        assert_eq!(data.completion_status, "completed");
        assert_eq!(data.success_status, "passed");
        assert_eq!(data.score, Some(87.5));
        assert_eq!(data.max_score, Some(100.0));
        assert_eq!(data.suspend_data.as_deref(), Some("bookmark=4"));
    }

    #[test]
    fn scorm12_failed_maps_to_incomplete() {
        let mut rt = started(ScormVersion::Scorm12);
        rt.set_value("cmi.core.lesson_status", "failed");
        rt.set_value("cmi.core.score.raw", "");
        let data = rt.completion_data();
        assert_eq!(data.completion_status, "incomplete");
        assert_eq!(data.success_status, "failed");
        assert_eq!(data.score, None);
        assert_eq!(data.suspend_data, None);
    }

    #[test]
    fn scorm2004_statuses_pass_through() {
        let mut rt = started(ScormVersion::Scorm2004);
        rt.set_value("cmi.completion_status", "incomplete");
        rt.set_value("cmi.success_status", "passed");
        rt.set_value("cmi.score.raw", " 42 ");
        rt.set_value("cmi.score.max", "50");
        rt.set_value("cmi.suspend_data", "{\"slide\":7}");
        let data = rt.completion_data();
        assert_eq!(data.completion_status, "incomplete");
        assert_eq!(data.success_status, "passed");
        assert_eq!(data.score, Some(42.0));
        assert_eq!(data.max_score, Some(50.0));
        assert_eq!(data.suspend_data.as_deref(), Some("{\"slide\":7}"));

        rt.set_value("cmi.score.raw", "n/a");
        assert_eq!(rt.completion_data().score, None);
    }

    #[test]
    fn version_serializes_as_release_number() {
        assert_eq!(serde_json::to_string(&ScormVersion::Scorm2004).unwrap(), "\"2004\"");
        let v: ScormVersion = serde_json::from_str("\"1.2\"").unwrap();
        assert_eq!(v, ScormVersion::Scorm12);
    }
}
