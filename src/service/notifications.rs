use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::validation::require;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Notification, NotificationKind, is_valid_id, new_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: String,
    #[serde(default)]
    pub from_name: Option<String>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

pub fn send(store: &dyn Store, req: NewNotification) -> Result<Notification> {
    if !is_valid_id(&req.user_id) {
        return Err(Error::BadRequest("userId is not a valid identifier".to_string()));
    }
    require("message", &req.message)?;

    let notification = Notification {
        id: new_id(),
        user_id: req.user_id,
        from_name: req.from_name,
        message: req.message,
        kind: req.kind,
        read: false,
        date: req.date.unwrap_or_else(Utc::now),
    };

    store.create_notification(&notification)?;
    debug!(notification_id = %notification.id, user_id = %notification.user_id, kind = %notification.kind, "Notification sent");
    Ok(notification)
}

/// Newest first. An id that cannot belong to any record yields an empty list
/// without touching the store.
pub fn list_for_user(store: &dyn Store, user_id: &str) -> Result<Vec<Notification>> {
    if !is_valid_id(user_id) {
        return Ok(Vec::new());
    }
    store.list_user_notifications(user_id)
}

/// Marks one notification read. Unknown ids are ignored.
pub fn mark_read(store: &dyn Store, id: &str) -> Result<()> {
    if !store.mark_notification_read(id)? {
        debug!(notification_id = id, "Mark-read for unknown notification ignored");
    }
    Ok(())
}
