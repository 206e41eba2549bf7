use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::campaign::{BirthdayCampaign, CampaignError, CampaignSummary};
use crate::routes::ErrorBody;

#[derive(Serialize)]
pub struct CampaignResponse {
    message: &'static str,
    result: CampaignSummary,
}

/// Runs today's campaign on demand, bypassing the daily trigger.
#[tracing::instrument(name = "Manual birthday check triggered via API", skip(campaign))]
pub async fn run_birthday_campaign(
    State(campaign): State<BirthdayCampaign>,
) -> Result<Json<CampaignResponse>, CampaignError> {
    // A client hanging up drops this future; the detached run carries on.
    let result = campaign
        .spawn_run()
        .await
        .map_err(CampaignError::Interrupted)??;

    Ok(Json(CampaignResponse {
        message: "Birthday check completed",
        result,
    }))
}

impl IntoResponse for CampaignError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:?}", self);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(&self)),
        )
            .into_response()
    }
}
