use uuid::Uuid;

use crate::api::pagination::PaginatedResponse;
use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::CourseReview;
use crate::repositories;
use crate::repositories::course_reviews::CreateCourseReview;
use crate::services::errors::{DomainError, DomainResult};

/// Running average and count stored on the course row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RatingAggregate {
    pub(crate) average: f64,
    pub(crate) count: i32,
}

pub(crate) fn validate_rating(rating: i16) -> Result<(), DomainError> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::InvalidInput("rating must be between 1 and 5".to_string()));
    }
    Ok(())
}

/// Folds a first-time review into the aggregate.
pub(crate) fn add(current: RatingAggregate, rating: i16) -> RatingAggregate {
    let count = current.count.max(0);
    let total = current.average * f64::from(count) + f64::from(rating);
    RatingAggregate { average: bounded(total / f64::from(count + 1)), count: count + 1 }
}

/// Swaps a student's previous rating for a new one; the count is unchanged.
pub(crate) fn replace(current: RatingAggregate, previous: i16, rating: i16) -> RatingAggregate {
    if current.count <= 0 {
        return add(RatingAggregate { average: 0.0, count: 0 }, rating);
    }
    let count = f64::from(current.count);
    let total = current.average * count - f64::from(previous) + f64::from(rating);
    RatingAggregate { average: bounded(total / count), count: current.count }
}

fn bounded(average: f64) -> f64 {
    if average.is_finite() {
        average.clamp(0.0, 5.0)
    } else {
        0.0
    }
}

pub(crate) struct RatingsService;

impl RatingsService {
    /// Adds or replaces the student's review and folds it into the course
    /// aggregate. The course row stays locked until both writes commit.
    pub(crate) async fn rate(
        state: &AppState,
        student: &Principal,
        course_id: &str,
        rating: i16,
        comment: &str,
    ) -> DomainResult<(CourseReview, RatingAggregate)> {
        validate_rating(rating)?;
        let comment = comment.trim();
        let mut tx = state.db().begin().await?;

        let course = repositories::courses::lock_published(&mut *tx, course_id)
            .await?
            .ok_or_else(DomainError::course_not_found)?;
        if !repositories::enrollments::exists(&mut *tx, &student.user_id, course_id).await? {
            return Err(DomainError::InvalidState(
                "Only enrolled students can review this course".to_string(),
            ));
        }

        let current = RatingAggregate { average: course.average_rating, count: course.rating_count };
        let now = primitive_now_utc();
        let existing =
            repositories::course_reviews::find_for_update(&mut *tx, course_id, &student.user_id)
                .await?;

        let (review, aggregate) = match existing {
            Some(previous) => {
                let aggregate = replace(current, previous.rating, rating);
                let review =
                    repositories::course_reviews::update(&mut *tx, &previous.id, rating, comment, now)
                        .await?;
                (review, aggregate)
            }
            None => {
                let review = repositories::course_reviews::create(
                    &mut *tx,
                    CreateCourseReview {
                        id: &Uuid::new_v4().to_string(),
                        course_id,
                        student_id: &student.user_id,
                        student_name: &student.name,
                        rating,
                        comment,
                        created_at: now,
                    },
                )
                .await?;
                (review, add(current, rating))
            }
        };

        repositories::courses::update_rating(
            &mut *tx,
            course_id,
            aggregate.average,
            aggregate.count,
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            course_id,
            student_id = %student.user_id,
            rating,
            average = aggregate.average,
            count = aggregate.count,
            action = "rate_course",
            "Course rating updated"
        );
        Ok((review, aggregate))
    }

    pub(crate) async fn list_for_course(
        state: &AppState,
        course_id: &str,
        skip: i64,
        limit: i64,
    ) -> DomainResult<PaginatedResponse<CourseReview>> {
        repositories::courses::find_published(state.db(), course_id)
            .await?
            .ok_or_else(DomainError::course_not_found)?;
        let items =
            repositories::course_reviews::list_for_course(state.db(), course_id, skip, limit).await?;
        let total_count = repositories::course_reviews::count_for_course(state.db(), course_id).await?;
        Ok(PaginatedResponse { items, total_count, skip, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn new_review_updates_running_average() {
        let next = add(RatingAggregate { average: 4.0, count: 2 }, 5);
        assert!(close(next.average, 13.0 / 3.0));
        assert_eq!(next.count, 3);
    }

    #[test]
    fn edited_review_keeps_count_and_adjusts_average() {
        let after_add = add(RatingAggregate { average: 4.0, count: 2 }, 5);
        let after_edit = replace(after_add, 5, 3);

        // (4.0 * 2 + 5 - 5 + 3) / 3
        assert!(close(after_edit.average, 11.0 / 3.0));
        assert_eq!(after_edit.count, 3);
    }

    #[test]
    fn first_review_sets_average() {
        let first = add(RatingAggregate { average: 0.0, count: 0 }, 4);
        assert!(close(first.average, 4.0));
        assert_eq!(first.count, 1);
    }

    #[test]
    fn replace_on_empty_aggregate_behaves_like_add() {
        let fixed = replace(RatingAggregate { average: 0.0, count: 0 }, 2, 5);
        assert_eq!(fixed, RatingAggregate { average: 5.0, count: 1 });
    }

    #[test]
    fn rating_range_is_enforced() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
    }
}
