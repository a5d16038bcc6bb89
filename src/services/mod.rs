pub(crate) mod asset_refs;
pub(crate) mod assets;
pub(crate) mod catalog;
pub(crate) mod course_authoring;
pub(crate) mod course_drafts;
pub(crate) mod course_outline;
pub(crate) mod course_review;
pub(crate) mod enrollments;
pub(crate) mod errors;
pub(crate) mod notifications;
pub(crate) mod progress;
pub(crate) mod ratings;
pub(crate) mod storage;
pub(crate) mod verification;
