// CMI data model tables for SCORM 1.2 and 2004

use super::ScormVersion;

/// Data-model keys the runtime reads back when building completion data.
pub struct ElementKeys {
    pub completion: &'static str,
    pub success: Option<&'static str>,
    pub score_raw: &'static str,
    pub score_max: &'static str,
    pub suspend_data: &'static str,
}

pub const KEYS_12: ElementKeys = ElementKeys {
    completion: "cmi.core.lesson_status",
    success: None,
    score_raw: "cmi.core.score.raw",
    score_max: "cmi.core.score.max",
    suspend_data: "cmi.suspend_data",
};

pub const KEYS_2004: ElementKeys = ElementKeys {
    completion: "cmi.completion_status",
    success: Some("cmi.success_status"),
    score_raw: "cmi.score.raw",
    score_max: "cmi.score.max",
    suspend_data: "cmi.suspend_data",
};

pub fn keys(version: ScormVersion) -> &'static ElementKeys {
    match version {
        ScormVersion::Scorm12 => &KEYS_12,
        ScormVersion::Scorm2004 => &KEYS_2004,
    }
}

/// Values every fresh session starts with.
pub fn defaults(version: ScormVersion) -> &'static [(&'static str, &'static str)] {
    match version {
        ScormVersion::Scorm12 => &[
            ("cmi.core.lesson_status", "not attempted"),
            ("cmi.core.score.min", "0"),
            ("cmi.core.score.max", "100"),
        ],
        ScormVersion::Scorm2004 => &[
            ("cmi.completion_status", "not attempted"),
            ("cmi.success_status", "unknown"),
            ("cmi.score.min", "0"),
            ("cmi.score.max", "100"),
        ],
    }
}

/// Only the `cmi.` and `adl.` namespaces are addressable.
pub fn is_accepted_element(el: &str) -> bool {
    el.starts_with("cmi.") || el.starts_with("adl.")
}

/// 1.2 `lesson_status` folded into a 2004-style completion status.
pub fn completion_from_lesson_status(v: &str) -> &'static str {
    match v {
        "completed" | "passed" => "completed",
        "incomplete" | "failed" => "incomplete",
        _ => "not attempted",
    }
}

/// 1.2 `lesson_status` folded into a 2004-style success status.
pub fn success_from_lesson_status(v: &str) -> &'static str {
    match v {
        "passed" => "passed",
        "failed" => "failed",
        _ => "unknown",
    }
}

pub const NO_ERROR: &str = "0";
pub const GENERAL_EXCEPTION: &str = "101";
pub const NOT_INITIALIZED: &str = "301";
pub const NOT_IMPLEMENTED: &str = "401";

pub fn error_string(code: &str) -> &'static str {
    match code {
        "0" => "No error",
        "101" => "General exception",
        "201" => "Invalid argument error",
        "301" => "Not initialized",
        "401" => "Not implemented error",
        "402" => "Invalid set value, element is a keyword",
        "403" => "Element is read only",
        "404" => "Element is write only",
        _ => "Unknown error",
    }
}
