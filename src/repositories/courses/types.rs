use sqlx::types::Json;
use time::PrimitiveDateTime;

use crate::db::models::{Module, StoredAsset, Tombstones};
use crate::db::types::CourseStatus;

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) instructor_id: &'a str,
    pub(crate) instructor_name: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) price: f64,
    pub(crate) category: &'a str,
    pub(crate) tags: &'a [String],
    pub(crate) thumbnail: &'a StoredAsset,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Compare-and-swap write of a draft's module tree.
pub(crate) struct OutlineWrite<'a> {
    pub(crate) course_id: &'a str,
    pub(crate) instructor_id: &'a str,
    pub(crate) expected_version: i64,
    pub(crate) modules: &'a [Module],
    pub(crate) tombstones: &'a Tombstones,
    pub(crate) course_duration: f64,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateDetails {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) price: Option<f64>,
    pub(crate) category: Option<String>,
    pub(crate) tags: Option<Json<Vec<String>>>,
    pub(crate) thumbnail: Option<Json<StoredAsset>>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct DecisionWrite<'a> {
    pub(crate) course_id: &'a str,
    pub(crate) status: CourseStatus,
    pub(crate) feedback: &'a str,
    pub(crate) reviewer_id: &'a str,
    pub(crate) reviewed_at: PrimitiveDateTime,
    pub(crate) published_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CatalogSort {
    Latest,
    Oldest,
}

#[derive(Debug, Clone)]
pub(crate) struct CatalogFilter {
    pub(crate) category: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) title: Option<String>,
    pub(crate) sort: CatalogSort,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CourseAnalyticsRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) status: CourseStatus,
    pub(crate) average_rating: f64,
    pub(crate) rating_count: i32,
    pub(crate) enrollment_count: i64,
}
