use std::convert::Infallible;

use serde::Deserialize;
use service_core::{EndpointError, Principal};
use uuid::Uuid;

use crate::domain::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::TeacherReviews;
use crate::repository::ReviewRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewPageRequest {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl ReviewPageRequest {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

type Error = EndpointError<Infallible>;

/// Rating summary of a teacher plus one page of their reviews, most recent first.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn get_teacher_reviews(
    repo: &impl ReviewRepository,
    principal: &Principal,
    teacher_id: Uuid,
    request: ReviewPageRequest,
) -> Result<TeacherReviews, Error> {
    let summary = repo
        .rating_summary(teacher_id)
        .await
        .map_err(service_core::simple_err_map!("Summarising ratings failed.", Error::internal()))?;
    let reviews = repo
        .reviews_for_teacher(teacher_id, request.limit(), request.offset())
        .await
        .map_err(service_core::simple_err_map!("Listing reviews failed.", Error::internal()))?;

    Ok(TeacherReviews {
        teacher_id,
        summary,
        reviews,
        limit: request.limit(),
        offset: request.offset(),
    })
}
