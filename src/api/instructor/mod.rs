use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::core::state::AppState;

mod courses;
mod outline;
mod reviews;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/:course_id",
            get(courses::get_course).patch(courses::update_course).delete(courses::delete_course),
        )
        .route("/courses/:course_id/modules", post(outline::append_module))
        .route("/courses/:course_id/modules/order", put(outline::reorder_modules))
        .route("/courses/:course_id/modules/:module_id", delete(outline::delete_module))
        .route("/courses/:course_id/modules/:module_id/videos", post(outline::append_video))
        .route(
            "/courses/:course_id/modules/:module_id/videos/order",
            put(outline::reorder_videos),
        )
        .route(
            "/courses/:course_id/modules/:module_id/videos/:video_id",
            delete(outline::delete_video),
        )
        .route(
            "/courses/:course_id/review-requests",
            get(reviews::review_history).post(reviews::submit_for_review),
        )
        .route("/courses/:course_id/analytics", get(courses::course_analytics))
        .route("/courses/:course_id/reviews", get(courses::student_reviews))
        .route(
            "/verification-requests",
            get(reviews::list_verification_requests).post(reviews::submit_verification),
        )
}
