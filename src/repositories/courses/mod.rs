mod commands;
mod queries;
mod types;

pub(crate) use commands::*;
pub(crate) use queries::*;
pub(crate) use types::*;

pub(crate) const COLUMNS: &str = "id, instructor_id, instructor_name, title, description, price, \
    category, tags, thumbnail, modules, tombstones, course_duration, status, average_rating, \
    rating_count, version, review_feedback, reviewed_by, reviewed_at, submitted_for_review_at, \
    published_at, created_at, updated_at";
