use crate::models::{Activity, Bundle, Course, LearningPath, Module, Ref, Section};

fn resolved<T>(refs: &[Ref<T>]) -> impl Iterator<Item = &T> {
    refs.iter().filter_map(Ref::resolved)
}

pub fn bundle_modules(bundle: &Bundle) -> Vec<&Module> {
    resolved(&bundle.modules).collect()
}

/// Populated courses of a bundle, module by module.
pub fn bundle_courses(bundle: &Bundle) -> Vec<&Course> {
    resolved(&bundle.modules)
        .flat_map(|module| resolved(&module.courses))
        .collect()
}

pub fn bundle_course_ids(bundle: &Bundle) -> Vec<String> {
    bundle_courses(bundle)
        .into_iter()
        .map(|course| course.id.clone())
        .collect()
}

pub fn learning_path_bundles(path: &LearningPath) -> Vec<&Bundle> {
    resolved(&path.bundles).collect()
}

pub fn learning_path_modules(path: &LearningPath) -> Vec<&Module> {
    resolved(&path.bundles)
        .flat_map(|bundle| resolved(&bundle.modules))
        .collect()
}

/// Depth-first bundles → modules → courses, in declared order.
pub fn learning_path_courses(path: &LearningPath) -> Vec<&Course> {
    resolved(&path.bundles)
        .flat_map(|bundle| resolved(&bundle.modules))
        .flat_map(|module| resolved(&module.courses))
        .collect()
}

pub fn learning_path_course_ids(path: &LearningPath) -> Vec<String> {
    learning_path_courses(path)
        .into_iter()
        .map(|course| course.id.clone())
        .collect()
}

pub fn course_sections(course: &Course) -> Vec<&Section> {
    resolved(&course.sections).collect()
}

pub fn course_activities(course: &Course) -> Vec<&Activity> {
    resolved(&course.sections)
        .flat_map(|section| resolved(&section.activities))
        .collect()
}

pub fn section_activity_ids(section: &Section) -> Vec<String> {
    resolved(&section.activities)
        .map(|activity| activity.id.clone())
        .collect()
}

/// First module of the bundle holding a populated course with this id.
pub fn find_module_for_course<'a>(bundle: &'a Bundle, course_id: &str) -> Option<&'a Module> {
    resolved(&bundle.modules)
        .find(|module| resolved(&module.courses).any(|course| course.id == course_id))
}

pub fn find_module_in_path<'a>(path: &'a LearningPath, course_id: &str) -> Option<&'a Module> {
    resolved(&path.bundles).find_map(|bundle| find_module_for_course(bundle, course_id))
}

pub fn find_bundle_for_course<'a>(path: &'a LearningPath, course_id: &str) -> Option<&'a Bundle> {
    resolved(&path.bundles).find(|bundle| find_module_for_course(bundle, course_id).is_some())
}

pub fn find_section_for_activity<'a>(course: &'a Course, activity_id: &str) -> Option<&'a Section> {
    resolved(&course.sections)
        .find(|section| resolved(&section.activities).any(|activity| activity.id == activity_id))
}

pub fn find_activity<'a>(course: &'a Course, activity_id: &str) -> Option<&'a Activity> {
    course_activities(course)
        .into_iter()
        .find(|activity| activity.id == activity_id)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::*;

    pub fn activity(id: &str) -> Activity {
        Activity {
            id: id.into(),
            title: format!("Activity {id}"),
            activity_type: ActivityType::Video,
            scorm_package_url: None,
            video_url: None,
            document_url: None,
            survey: None,
        }
    }

    pub fn section(id: &str, activities: &[&str]) -> Section {
        Section {
            id: id.into(),
            title: format!("Section {id}"),
            description: None,
            activities: activities.iter().map(|a| activity(a).into()).collect(),
        }
    }

    pub fn course(id: &str, sections: Vec<Section>) -> Course {
        Course {
            id: id.into(),
            title: format!("Course {id}"),
            description: None,
            category: None,
            level: None,
            duration_minutes: None,
            created_at: None,
            sections: sections.into_iter().map(Ref::from).collect(),
        }
    }

    pub fn module(id: &str, courses: Vec<Ref<Course>>) -> Module {
        Module {
            id: id.into(),
            title: format!("Module {id}"),
            description: None,
            courses,
        }
    }

    pub fn bundle(id: &str, modules: Vec<Ref<Module>>) -> Bundle {
        Bundle {
            id: id.into(),
            title: format!("Bundle {id}"),
            description: None,
            modules,
        }
    }

    pub fn path(access_type: AccessType, bundles: Vec<Ref<Bundle>>) -> LearningPath {
        LearningPath {
            id: "lp".into(),
            title: "Path".into(),
            description: None,
            access_type,
            bundles,
        }
    }

    /// A path holding one bundle, one module, and the named empty courses.
    pub fn simple_path(access_type: AccessType, course_ids: &[&str]) -> LearningPath {
        let courses = course_ids
            .iter()
            .map(|id| course(id, vec![]).into())
            .collect();
        path(
            access_type,
            vec![bundle("b1", vec![module("m1", courses).into()]).into()],
        )
    }

    pub fn two_section_course() -> Course {
        course(
            "c1",
            vec![section("s1", &["a1", "a2"]), section("s2", &["a3", "a4"])],
        )
    }
}
