//! Dashboard analytics handler.

use axum::extract::State;

use c4m_models::AnalyticsSummary;

use crate::auth::CurrentEmployer;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_analytics(
    State(state): State<AppState>,
    employer: CurrentEmployer,
) -> ApiResult<Envelope<AnalyticsSummary>> {
    let summary = state.analytics.analytics_summary(&employer.id).await?;
    Ok(Envelope::ok(summary))
}
