use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::db::models::Course;
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::courses::{CatalogFilter, CatalogSort};
use crate::schemas::course::{CatalogQuery, CatalogResponse, CourseSummary};
use crate::services::errors::{DomainError, DomainResult};

const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 50;

pub(crate) struct CatalogService;

impl CatalogService {
    pub(crate) async fn browse(state: &AppState, query: CatalogQuery) -> DomainResult<CatalogResponse> {
        let (filter, page) = build_filter(query)?;
        let items = repositories::courses::list_catalog(state.db(), &filter).await?;
        let total_count = repositories::courses::count_catalog(state.db(), &filter).await?;

        Ok(CatalogResponse {
            items: items.into_iter().map(CourseSummary::from_db).collect(),
            total_count,
            page,
            limit: filter.limit,
            total_pages: total_pages(total_count, filter.limit),
        })
    }

    /// Returns a published course and whether the viewer may see video URLs.
    pub(crate) async fn detail(
        state: &AppState,
        viewer: Option<&Principal>,
        course_id: &str,
    ) -> DomainResult<(Course, bool)> {
        let course = repositories::courses::find_published(state.db(), course_id)
            .await?
            .ok_or_else(DomainError::course_not_found)?;

        let include_assets = match viewer {
            Some(principal) if principal.role == UserRole::Student => {
                repositories::enrollments::exists(state.db(), &principal.user_id, course_id).await?
            }
            Some(principal) if principal.role == UserRole::Admin => true,
            Some(principal) => principal.user_id == course.instructor_id,
            None => false,
        };
        Ok((course, include_assets))
    }
}

fn build_filter(query: CatalogQuery) -> DomainResult<(CatalogFilter, i64)> {
    let sort = match query.sort.as_deref().map(str::trim) {
        None | Some("") | Some("latest") => CatalogSort::Latest,
        Some("oldest") => CatalogSort::Oldest,
        Some(other) => {
            return Err(DomainError::InvalidInput(format!("Unknown sort '{other}'")));
        }
    };

    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(DomainError::InvalidInput("page must be at least 1".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(DomainError::InvalidInput(format!("limit must be between 1 and {MAX_PAGE_SIZE}")));
    }

    let tags = query
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    let filter = CatalogFilter {
        category: non_blank(query.category),
        tags,
        title: non_blank(query.title),
        sort,
        skip: (page - 1).saturating_mul(limit),
        limit,
    };
    Ok((filter, page))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn total_pages(total_count: i64, limit: i64) -> i64 {
    if total_count <= 0 || limit <= 0 {
        return 0;
    }
    (total_count + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_latest_first_page() {
        let (filter, page) = build_filter(CatalogQuery::default()).expect("filter");
        assert_eq!(page, 1);
        assert_eq!(filter.skip, 0);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.sort, CatalogSort::Latest);
        assert!(filter.tags.is_empty());
    }

    #[test]
    fn tags_are_split_and_blank_fields_dropped() {
        let query = CatalogQuery {
            tags: Some("rust, async,,".to_string()),
            category: Some("  ".to_string()),
            title: Some(" tokio ".to_string()),
            sort: Some("oldest".to_string()),
            page: Some(3),
            limit: Some(10),
        };
        let (filter, page) = build_filter(query).expect("filter");
        assert_eq!(filter.tags, vec!["rust", "async"]);
        assert_eq!(filter.category, None);
        assert_eq!(filter.title.as_deref(), Some("tokio"));
        assert_eq!(filter.sort, CatalogSort::Oldest);
        assert_eq!((page, filter.skip), (3, 20));
    }

    #[test]
    fn out_of_range_paging_is_rejected() {
        let too_big = CatalogQuery { limit: Some(51), ..CatalogQuery::default() };
        assert!(build_filter(too_big).is_err());
        let zero_page = CatalogQuery { page: Some(0), ..CatalogQuery::default() };
        assert!(build_filter(zero_page).is_err());
        let bad_sort = CatalogQuery { sort: Some("random".to_string()), ..CatalogQuery::default() };
        assert!(build_filter(bad_sort).is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
    }
}
