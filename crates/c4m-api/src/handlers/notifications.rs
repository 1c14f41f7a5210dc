//! Notification feed handlers.

use axum::extract::{Path, State};

use crate::auth::CurrentEmployer;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::services::NotificationFeed;
use crate::state::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    employer: CurrentEmployer,
) -> ApiResult<Envelope<NotificationFeed>> {
    let feed = state.notifications.list_notifications(&employer.id).await?;
    Ok(Envelope::ok(feed))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    employer: CurrentEmployer,
    Path(notification_id): Path<String>,
) -> ApiResult<Envelope<()>> {
    state
        .notifications
        .mark_notification_read(&employer.id, &notification_id)
        .await?;
    Ok(Envelope::done())
}
