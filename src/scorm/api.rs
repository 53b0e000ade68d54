use super::{ScormRuntime, ScormVersion};

pub struct Scorm12Api<'a> {
    rt: &'a mut ScormRuntime,
}

impl<'a> Scorm12Api<'a> {
    pub fn new(rt: &'a mut ScormRuntime) -> Self {
        Self { rt }
    }

    pub fn lms_initialize(&mut self, _param: &str) -> &'static str {
        self.rt.initialize()
    }

    pub fn lms_finish(&mut self, _param: &str) -> &'static str {
        self.rt.terminate()
    }

    pub fn lms_get_value(&mut self, element: &str) -> String {
        self.rt.get_value(element)
    }

    pub fn lms_set_value(&mut self, element: &str, value: &str) -> &'static str {
        self.rt.set_value(element, value)
    }

    pub fn lms_commit(&mut self, _param: &str) -> &'static str {
        self.rt.commit()
    }

    pub fn lms_get_last_error(&self) -> &'static str {
        self.rt.last_error()
    }

    pub fn lms_get_error_string(&self, code: &str) -> &'static str {
        self.rt.error_string(code)
    }

    pub fn lms_get_diagnostic(&self, code: &str) -> &'static str {
        self.rt.diagnostic(code)
    }
}

pub struct Scorm2004Api<'a> {
    rt: &'a mut ScormRuntime,
}

impl<'a> Scorm2004Api<'a> {
    pub fn new(rt: &'a mut ScormRuntime) -> Self {
        Self { rt }
    }

    pub fn initialize(&mut self, _param: &str) -> &'static str {
        self.rt.initialize()
    }

    pub fn terminate(&mut self, _param: &str) -> &'static str {
        self.rt.terminate()
    }

    pub fn get_value(&mut self, element: &str) -> String {
        self.rt.get_value(element)
    }

    pub fn set_value(&mut self, element: &str, value: &str) -> &'static str {
        self.rt.set_value(element, value)
    }

    pub fn commit(&mut self, _param: &str) -> &'static str {
        self.rt.commit()
    }

    pub fn get_last_error(&self) -> &'static str {
        self.rt.last_error()
    }

    pub fn get_error_string(&self, code: &str) -> &'static str {
        self.rt.error_string(code)
    }

    pub fn get_diagnostic(&self, code: &str) -> &'static str {
        self.rt.diagnostic(code)
    }
}

/// Invoke a method by its JavaScript name, as an iframe bridge forwards it.
/// Only the names of the runtime's own version are recognised; `None` for
/// anything else.
pub fn dispatch(rt: &mut ScormRuntime, method: &str, args: &[String]) -> Option<String> {
    let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_default();
    let out = match (rt.version(), method) {
        (ScormVersion::Scorm12, "LMSInitialize") | (ScormVersion::Scorm2004, "Initialize") => {
            rt.initialize().to_string()
        }
        (ScormVersion::Scorm12, "LMSFinish") | (ScormVersion::Scorm2004, "Terminate") => {
            rt.terminate().to_string()
        }
        (ScormVersion::Scorm12, "LMSGetValue") | (ScormVersion::Scorm2004, "GetValue") => {
            rt.get_value(arg(0))
        }
        (ScormVersion::Scorm12, "LMSSetValue") | (ScormVersion::Scorm2004, "SetValue") => {
            rt.set_value(arg(0), arg(1)).to_string()
        }
        (ScormVersion::Scorm12, "LMSCommit") | (ScormVersion::Scorm2004, "Commit") => {
            rt.commit().to_string()
        }
        (ScormVersion::Scorm12, "LMSGetLastError") | (ScormVersion::Scorm2004, "GetLastError") => {
            rt.last_error().to_string()
        }
        (ScormVersion::Scorm12, "LMSGetErrorString")
        | (ScormVersion::Scorm2004, "GetErrorString") => rt.error_string(arg(0)).to_string(),
        (ScormVersion::Scorm12, "LMSGetDiagnostic") | (ScormVersion::Scorm2004, "GetDiagnostic") => {
            rt.diagnostic(arg(0)).to_string()
        }
        _ => return None,
    };
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scorm12_names_drive_the_engine() {
        let mut rt = ScormRuntime::new(ScormVersion::Scorm12);
        let mut api = rt.scorm12();
        assert_eq!(api.lms_get_value("cmi.core.lesson_status"), "");
        assert_eq!(api.lms_get_last_error(), "301");
        assert_eq!(api.lms_get_error_string("301"), "Not initialized");
        assert_eq!(api.lms_initialize(""), "true");
        assert_eq!(api.lms_set_value("cmi.core.lesson_status", "passed"), "true");
        assert_eq!(api.lms_commit(""), "true");
        assert_eq!(api.lms_finish(""), "true");
        assert_eq!(api.lms_get_diagnostic("0"), "No error");

        let data = rt.completion_data();
        assert_eq!(data.completion_status, "completed");
        assert_eq!(data.success_status, "passed");
    }

    #[test]
    fn scorm2004_names_share_state_with_engine() {
        let mut rt = ScormRuntime::new(ScormVersion::Scorm2004);
        {
            let mut api = rt.scorm2004();
            assert_eq!(api.initialize(""), "true");
            assert_eq!(api.set_value("cmi.completion_status", "completed"), "true");
            assert_eq!(api.initialize(""), "false");
            assert_eq!(api.get_last_error(), "101");
            assert_eq!(api.get_error_string("101"), "General exception");
        }
        assert_eq!(rt.get_value("cmi.completion_status"), "completed");
        assert_eq!(rt.scorm2004().get_diagnostic("42"), "Unknown error");
        assert_eq!(rt.scorm2004().terminate(""), "true");
        assert_eq!(rt.scorm2004().commit(""), "false");
    }

    #[test]
    fn dispatch_only_knows_its_own_version() {
        let mut rt = ScormRuntime::new(ScormVersion::Scorm2004);
        assert_eq!(dispatch(&mut rt, "LMSInitialize", &[]), None);
        assert_eq!(dispatch(&mut rt, "Initialize", &["".into()]).as_deref(), Some("true"));
        let set = dispatch(
            &mut rt,
            "SetValue",
            &["cmi.success_status".into(), "failed".into()],
        );
        assert_eq!(set.as_deref(), Some("true"));
        assert_eq!(
            dispatch(&mut rt, "GetValue", &["cmi.success_status".into()]).as_deref(),
            Some("failed")
        );
        assert_eq!(dispatch(&mut rt, "GetValue", &[]).as_deref(), Some(""));
        assert_eq!(dispatch(&mut rt, "GetLastError", &[]).as_deref(), Some("401"));
    }
}
