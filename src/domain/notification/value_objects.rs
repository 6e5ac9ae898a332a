use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCategory {
    OrderStatus,
    FlashSale,
    StockProduct,
    ReviewRequest,
}

impl NotificationCategory {
    /// Label stored in the notifications table and shown by the app.
    pub fn label(self) -> &'static str {
        match self {
            NotificationCategory::OrderStatus => "Order Status",
            NotificationCategory::FlashSale => "Flash Sale",
            NotificationCategory::StockProduct => "Stock Product",
            NotificationCategory::ReviewRequest => "Review Request",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for NotificationCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Order Status" => Ok(NotificationCategory::OrderStatus),
            "Flash Sale" => Ok(NotificationCategory::FlashSale),
            "Stock Product" => Ok(NotificationCategory::StockProduct),
            "Review Request" => Ok(NotificationCategory::ReviewRequest),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadState {
    Unread,
    Read,
}

/// A notification about to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient_email: String,
    pub category: NotificationCategory,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_email: String,
    pub category: NotificationCategory,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_state: ReadState,
}
