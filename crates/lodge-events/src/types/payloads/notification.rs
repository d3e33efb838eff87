use std::collections::BTreeMap;

use lodge_core::{NotificationId, UserId};
use serde::{Deserialize, Serialize};

/// The service issued a notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotificationPayload {
    /// Notification affected.
    pub notification_id: NotificationId,
    /// Every user the notification concerns.
    pub all_notified_user_ids: Vec<UserId>,
    /// Direct recipients.
    pub to_user_ids: Vec<UserId>,
    /// Copied recipients.
    pub cc_user_ids: Vec<UserId>,
    /// Message template.
    pub template_name: String,
    /// Template revision.
    pub template_version: i64,
    /// Whether the built-in template text was used.
    pub default_template: bool,
    /// Values substituted into the template.
    pub template_params: BTreeMap<String, String>,
    /// Whether the email was handed off for delivery.
    pub email_sent: bool,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

/// The author read a notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReadPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Notification affected.
    pub notification_id: NotificationId,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}
