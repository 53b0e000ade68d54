use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::models::{ActivityType, Course, CourseLevel};
use crate::tree;

fn matches_query(course: &Course, needle: &str) -> bool {
    course.title.to_lowercase().contains(needle)
        || course
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Case-insensitive match on title or description. A blank query matches all.
pub fn search_courses<'a>(courses: &'a [Course], query: &str) -> Vec<&'a Course> {
    let needle = query.trim().to_lowercase();
    courses
        .iter()
        .filter(|course| needle.is_empty() || matches_query(course, &needle))
        .collect()
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub activity_type: Option<ActivityType>,
}

impl CatalogFilter {
    pub fn matches(&self, course: &Course) -> bool {
        let category_ok = self.category.as_deref().map_or(true, |wanted| {
            course
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
        });
        let level_ok = self.level.map_or(true, |wanted| course.level == Some(wanted));
        let type_ok = self.activity_type.map_or(true, |wanted| {
            tree::course_activities(course)
                .iter()
                .any(|a| a.activity_type == wanted)
        });
        category_ok && level_ok && type_ok
    }
}

pub fn filter_courses<'a>(courses: &[&'a Course], filter: &CatalogFilter) -> Vec<&'a Course> {
    courses
        .iter()
        .copied()
        .filter(|course| filter.matches(course))
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    TitleAsc,
    TitleDesc,
    Newest,
    Oldest,
    DurationAsc,
    DurationDesc,
}

// Some(_) before None regardless of direction.
fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort into a new vector; ties keep input order.
pub fn sort_courses<'a>(courses: &[&'a Course], sort: SortBy) -> Vec<&'a Course> {
    let mut sorted = courses.to_vec();
    sorted.sort_by(|a, b| match sort {
        SortBy::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortBy::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        SortBy::Newest => missing_last(a.created_at, b.created_at, true),
        SortBy::Oldest => missing_last(a.created_at, b.created_at, false),
        SortBy::DurationAsc => missing_last(a.duration_minutes, b.duration_minutes, false),
        SortBy::DurationDesc => missing_last(a.duration_minutes, b.duration_minutes, true),
    });
    sorted
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Page numbers are 1-based and clamped into range; `end_index` is exclusive.
pub fn calculate_pagination(page: usize, page_size: usize, total_items: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start_index = ((page - 1) * page_size).min(total_items);
    let end_index = (start_index + page_size).min(total_items);
    Pagination {
        page,
        page_size,
        total_items,
        total_pages,
        start_index,
        end_index,
        has_next: page < total_pages,
        has_previous: page > 1,
    }
}

pub fn paginate<'a, T>(items: &'a [T], pagination: &Pagination) -> &'a [T] {
    let start = pagination.start_index.min(items.len());
    let end = pagination.end_index.clamp(start, items.len());
    &items[start..end]
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub filter: CatalogFilter,
    #[serde(default)]
    pub sort: SortBy,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub const DEFAULT_PAGE_SIZE: usize = 12;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage<'a> {
    pub courses: Vec<&'a Course>,
    pub pagination: Pagination,
}

pub fn query_catalog<'a>(courses: &'a [Course], query: &CatalogQuery) -> CatalogPage<'a> {
    let found = search_courses(courses, query.search.as_deref().unwrap_or_default());
    let filtered = filter_courses(&found, &query.filter);
    let sorted = sort_courses(&filtered, query.sort);
    let pagination = calculate_pagination(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        sorted.len(),
    );
    CatalogPage {
        courses: paginate(&sorted, &pagination).to_vec(),
        pagination,
    }
}
