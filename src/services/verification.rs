use uuid::Uuid;

use crate::api::pagination::PaginatedResponse;
use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::VerificationRequest;
use crate::db::types::{Decision, VerificationStatus};
use crate::repositories;
use crate::repositories::verification_requests::CreateVerificationRequest;
use crate::schemas::verification::VerificationCreate;
use crate::services::asset_refs::AssetClass;
use crate::services::assets::{AssetsService, PendingDeletion};
use crate::services::errors::{DomainError, DomainResult};
use crate::services::notifications::{Notification, NotificationsService};

#[derive(Debug)]
pub(crate) enum VerificationSubmit {
    AlreadyVerified,
    Submitted(VerificationRequest),
}

pub(crate) struct VerificationService;

impl VerificationService {
    pub(crate) async fn submit(
        state: &AppState,
        instructor: &Principal,
        payload: VerificationCreate,
    ) -> DomainResult<VerificationSubmit> {
        let approved = repositories::verification_requests::find_latest_for_user(
            state.db(),
            &instructor.user_id,
            VerificationStatus::Approved,
        )
        .await?;
        if instructor.instructor_verified || approved.is_some() {
            return Ok(VerificationSubmit::AlreadyVerified);
        }

        let pending = repositories::verification_requests::find_latest_for_user(
            state.db(),
            &instructor.user_id,
            VerificationStatus::Pending,
        )
        .await?;
        if pending.is_some() {
            return Err(already_pending());
        }

        let resume =
            AssetsService::resolve(state, AssetClass::Resume, &payload.resume, &instructor.user_id)
                .await?;
        let portfolio = payload
            .portfolio_link
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let created = repositories::verification_requests::create(
            state.db(),
            CreateVerificationRequest {
                id: &Uuid::new_v4().to_string(),
                user_id: &instructor.user_id,
                user_name: &instructor.name,
                user_email: &instructor.email,
                highest_qualification: payload.highest_qualification.trim(),
                experience_years: payload.experience_years,
                portfolio_link: portfolio,
                resume: &resume.asset,
                created_at: primitive_now_utc(),
            },
        )
        .await;

        match created {
            Ok(request) => {
                tracing::info!(
                    user_id = %instructor.user_id,
                    request_id = %request.id,
                    action = "submit_verification",
                    "Verification request submitted"
                );
                Ok(VerificationSubmit::Submitted(request))
            }
            Err(err) => {
                AssetsService::discard(
                    state,
                    &[PendingDeletion::new(resume.asset.public_id.clone(), AssetClass::Resume)],
                )
                .await;
                if db::is_unique_violation(&err) {
                    return Err(already_pending());
                }
                Err(err.into())
            }
        }
    }

    pub(crate) async fn list_for_user(
        state: &AppState,
        user_id: &str,
    ) -> DomainResult<Vec<VerificationRequest>> {
        Ok(repositories::verification_requests::list_for_user(state.db(), user_id).await?)
    }

    pub(crate) async fn list(
        state: &AppState,
        status: Option<VerificationStatus>,
        skip: i64,
        limit: i64,
    ) -> DomainResult<PaginatedResponse<VerificationRequest>> {
        let items =
            repositories::verification_requests::list(state.db(), status, skip, limit).await?;
        let total_count = repositories::verification_requests::count(state.db(), status).await?;
        Ok(PaginatedResponse { items, total_count, skip, limit })
    }

    pub(crate) async fn decide(
        state: &AppState,
        admin: &Principal,
        request_id: &str,
        decision: Decision,
        message: &str,
    ) -> DomainResult<VerificationRequest> {
        let message = message.trim();
        let decided = repositories::verification_requests::record_decision(
            state.db(),
            request_id,
            decision.into(),
            message,
            &admin.user_id,
            primitive_now_utc(),
        )
        .await?;

        let Some(decided) = decided else {
            if repositories::verification_requests::exists(state.db(), request_id).await? {
                return Err(DomainError::InvalidState(
                    "Verification request was already processed".to_string(),
                ));
            }
            return Err(DomainError::NotFound("Verification request not found".to_string()));
        };

        tracing::info!(
            request_id,
            user_id = %decided.user_id,
            reviewer_id = %admin.user_id,
            decision = decision.as_str(),
            action = "verification_decision",
            "Verification request decided"
        );

        NotificationsService::enqueue_after_commit(
            state.db(),
            Notification::verification_decision(
                &decided.user_email,
                &decided.id,
                &decided.user_name,
                decision.as_str(),
                message,
            ),
        )
        .await;

        Ok(decided)
    }
}

pub(crate) fn parse_status(value: Option<&str>) -> DomainResult<Option<VerificationStatus>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some("pending") => Ok(Some(VerificationStatus::Pending)),
        Some("approved") => Ok(Some(VerificationStatus::Approved)),
        Some("rejected") => Ok(Some(VerificationStatus::Rejected)),
        Some(other) => Err(DomainError::InvalidInput(format!("Unknown status '{other}'"))),
    }
}

fn already_pending() -> DomainError {
    DomainError::Conflict("A verification request is already pending".to_string())
}
