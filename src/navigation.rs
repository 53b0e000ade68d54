use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::models::{Activity, ActivityType, Course};
use crate::tree;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NavItemKind {
    Section,
    Activity,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NavItemKind,
    pub activity_type: Option<ActivityType>,
    pub section_id: Option<String>,
    pub is_completed: bool,
    pub is_current: bool,
    pub is_locked: bool,
    pub order: usize,
}

/// Outline of a course: each section header followed by its activities.
///
/// `order` counts every item, headers included, from zero. A section is
/// completed only when it has activities and all of them are in `completed`.
pub fn build_navigation_tree(
    course: &Course,
    completed: &HashSet<String>,
    current_activity_id: Option<&str>,
) -> Vec<NavigationItem> {
    let mut items = Vec::new();
    for section in tree::course_sections(course) {
        let activities: Vec<&Activity> = section
            .activities
            .iter()
            .filter_map(|a| a.resolved())
            .collect();
        let section_done =
            !activities.is_empty() && activities.iter().all(|a| completed.contains(&a.id));
        items.push(NavigationItem {
            id: section.id.clone(),
            title: section.title.clone(),
            kind: NavItemKind::Section,
            activity_type: None,
            section_id: None,
            is_completed: section_done,
            is_current: false,
            is_locked: false,
            order: items.len(),
        });
        for activity in activities {
            items.push(NavigationItem {
                id: activity.id.clone(),
                title: activity.title.clone(),
                kind: NavItemKind::Activity,
                activity_type: Some(activity.activity_type),
                section_id: Some(section.id.clone()),
                is_completed: completed.contains(&activity.id),
                is_current: current_activity_id == Some(activity.id.as_str()),
                is_locked: false,
                order: items.len(),
            });
        }
    }
    items
}

fn position_index(activities: &[&Activity], activity_id: &str) -> Option<usize> {
    activities.iter().position(|a| a.id == activity_id)
}

pub fn get_next_activity<'a>(course: &'a Course, current_id: &str) -> Option<&'a Activity> {
    let activities = tree::course_activities(course);
    let idx = position_index(&activities, current_id)?;
    activities.get(idx + 1).copied()
}

pub fn get_previous_activity<'a>(course: &'a Course, current_id: &str) -> Option<&'a Activity> {
    let activities = tree::course_activities(course);
    let idx = position_index(&activities, current_id)?;
    idx.checked_sub(1).map(|prev| activities[prev])
}

pub fn is_first_activity(course: &Course, activity_id: &str) -> bool {
    position_index(&tree::course_activities(course), activity_id) == Some(0)
}

pub fn is_last_activity(course: &Course, activity_id: &str) -> bool {
    let activities = tree::course_activities(course);
    match position_index(&activities, activity_id) {
        Some(idx) => idx + 1 == activities.len(),
        None => false,
    }
}

/// 1-based position among the course's activities.
pub fn get_activity_position(course: &Course, activity_id: &str) -> Option<usize> {
    position_index(&tree::course_activities(course), activity_id).map(|idx| idx + 1)
}

pub fn total_activities(course: &Course) -> usize {
    tree::course_activities(course).len()
}

pub fn can_navigate_next(course: &Course, activity_id: &str) -> bool {
    get_activity_position(course, activity_id).is_some() && !is_last_activity(course, activity_id)
}

pub fn can_navigate_previous(course: &Course, activity_id: &str) -> bool {
    get_activity_position(course, activity_id).is_some() && !is_first_activity(course, activity_id)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CrumbKind {
    Course,
    Section,
    Activity,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: CrumbKind,
}

/// `[course, section, activity]`, or empty when the activity is not in the course.
pub fn find_activity_path(course: &Course, activity_id: &str) -> Vec<Breadcrumb> {
    let Some(section) = tree::find_section_for_activity(course, activity_id) else {
        return Vec::new();
    };
    let Some(activity) = section
        .activities
        .iter()
        .filter_map(|a| a.resolved())
        .find(|a| a.id == activity_id)
    else {
        return Vec::new();
    };
    vec![
        Breadcrumb {
            id: course.id.clone(),
            title: course.title.clone(),
            kind: CrumbKind::Course,
        },
        Breadcrumb {
            id: section.id.clone(),
            title: section.title.clone(),
            kind: CrumbKind::Section,
        },
        Breadcrumb {
            id: activity.id.clone(),
            title: activity.title.clone(),
            kind: CrumbKind::Activity,
        },
    ]
}

/// Everything the player chrome needs about the current activity.
#[skip_serializing_none]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub items: Vec<NavigationItem>,
    pub total_activities: usize,
    pub position: Option<usize>,
    pub previous_activity_id: Option<String>,
    pub next_activity_id: Option<String>,
    pub is_first: bool,
    pub is_last: bool,
    pub can_navigate_next: bool,
    pub can_navigate_previous: bool,
    pub breadcrumb: Vec<Breadcrumb>,
}

pub fn navigation_state(
    course: &Course,
    completed: &HashSet<String>,
    current_activity_id: Option<&str>,
) -> NavigationState {
    let items = build_navigation_tree(course, completed, current_activity_id);
    let current = current_activity_id.unwrap_or_default();
    NavigationState {
        items,
        total_activities: total_activities(course),
        position: get_activity_position(course, current),
        previous_activity_id: get_previous_activity(course, current).map(|a| a.id.clone()),
        next_activity_id: get_next_activity(course, current).map(|a| a.id.clone()),
        is_first: is_first_activity(course, current),
        is_last: is_last_activity(course, current),
        can_navigate_next: can_navigate_next(course, current),
        can_navigate_previous: can_navigate_previous(course, current),
        breadcrumb: find_activity_path(course, current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ref;
    use crate::tree::fixtures::*;

    fn done(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn outline_interleaves_headers_and_activities_in_order() {
        let course = two_section_course();
        let items = build_navigation_tree(&course, &done(&["a1", "a2", "a3"]), Some("a3"));
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "a1", "a2", "s2", "a3", "a4"]);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.order, i);
            assert!(!item.is_locked);
        }
        assert_eq!(items[0].kind, NavItemKind::Section);
        assert!(items[0].is_completed);
        assert!(!items[3].is_completed);
        assert!(items[4].is_current);
        assert_eq!(items.iter().filter(|i| i.is_current).count(), 1);
        assert_eq!(items[5].section_id.as_deref(), Some("s2"));
    }

    #[test]
    fn empty_section_is_never_completed() {
        let course = course("c", vec![section("s-empty", &[])]);
        let items = build_navigation_tree(&course, &done(&[]), None);
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_completed);
    }

    #[test]
    fn unresolved_nodes_are_left_out() {
        let mut c = two_section_course();
        c.sections.push(Ref::Unresolved("s-bare".into()));
        if let Ref::Resolved(s) = &mut c.sections[0] {
            s.activities.insert(0, Ref::Unresolved("a-bare".into()));
        }
        let items = build_navigation_tree(&c, &done(&[]), None);
        assert_eq!(items.len(), 6);
        assert_eq!(get_activity_position(&c, "a1"), Some(1));
    }

    #[test]
    fn next_and_previous_cross_section_boundaries() {
        let c = two_section_course();
        assert_eq!(get_next_activity(&c, "a2").map(|a| a.id.as_str()), Some("a3"));
        assert!(get_next_activity(&c, "a4").is_none());
        assert_eq!(get_previous_activity(&c, "a3").map(|a| a.id.as_str()), Some("a2"));
        assert!(get_previous_activity(&c, "a1").is_none());
        assert!(get_next_activity(&c, "nope").is_none());
        assert!(get_previous_activity(&c, "nope").is_none());
    }

    #[test]
    fn positions_and_boundaries() {
        let c = two_section_course();
        assert_eq!(get_activity_position(&c, "a3"), Some(3));
        assert_eq!(get_activity_position(&c, "nope"), None);
        assert!(is_first_activity(&c, "a1"));
        assert!(is_last_activity(&c, "a4"));
        assert!(!is_first_activity(&c, "nope"));
        assert!(!is_last_activity(&c, "nope"));
        assert!(!can_navigate_next(&c, "a4"));
        assert!(!can_navigate_previous(&c, "a1"));
        assert!(can_navigate_next(&c, "a1"));
        assert!(can_navigate_previous(&c, "a4"));
        assert!(!can_navigate_next(&c, "nope"));
        assert!(!can_navigate_previous(&c, "nope"));
    }

    #[test]
    fn breadcrumb_names_course_section_activity() {
        let c = two_section_course();
        let path = find_activity_path(&c, "a3");
        let ids: Vec<&str> = path.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "s2", "a3"]);
        assert_eq!(path[1].kind, CrumbKind::Section);
        assert!(find_activity_path(&c, "nope").is_empty());
    }

    #[test]
    fn state_bundles_everything_for_current_activity() {
        let c = two_section_course();
        let state = navigation_state(&c, &done(&["a1"]), Some("a2"));
        assert_eq!(state.position, Some(2));
        assert_eq!(state.total_activities, 4);
        assert_eq!(state.previous_activity_id.as_deref(), Some("a1"));
        assert_eq!(state.next_activity_id.as_deref(), Some("a3"));
        assert!(state.can_navigate_next && state.can_navigate_previous);
        assert_eq!(state.breadcrumb.len(), 3);

        let none = navigation_state(&c, &done(&[]), None);
        assert_eq!(none.position, None);
        assert!(!none.can_navigate_next);
    }
}
