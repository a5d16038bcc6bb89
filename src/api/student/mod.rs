use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::core::state::AppState;

mod catalog;
mod learning;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(catalog::browse_courses))
        .route("/courses/:course_id", get(catalog::course_detail))
        .route("/courses/:course_id/enrollments", post(learning::enroll))
        .route(
            "/courses/:course_id/modules/:module_id/videos/:video_id/progress",
            patch(learning::save_progress),
        )
        .route(
            "/courses/:course_id/reviews",
            get(catalog::list_reviews).put(learning::rate_course),
        )
        .route("/me/enrollments", get(learning::my_enrollments))
}
