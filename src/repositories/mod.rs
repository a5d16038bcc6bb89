pub(crate) mod asset_usage;
pub(crate) mod course_reviews;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod notification_jobs;
pub(crate) mod review_requests;
pub(crate) mod verification_requests;
