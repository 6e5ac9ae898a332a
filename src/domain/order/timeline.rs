use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::ShippingConfig;
use super::stage::Stage;
use super::value_objects::{GeoPoint, ShippingSpeed};

// ============================================================================
// Shipment Timeline - pure projection of estimated stage arrivals
// ============================================================================
//
//   in_progress = created_at + 1h
//   shipped     = in_progress + 1 business day
//   delivered   = in_progress + transit business days (5 standard, 2 express)
//
// The transit window starts at in_progress, so the shipping day counts as the
// first transit day. Weekends are evaluated in UTC.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentTimeline {
    pub placed: DateTime<Utc>,
    pub in_progress: DateTime<Utc>,
    pub shipped: DateTime<Utc>,
    pub delivered: DateTime<Utc>,
}

impl ShipmentTimeline {
    pub fn estimated_arrival(&self, stage: Stage) -> DateTime<Utc> {
        match stage {
            Stage::Placed => self.placed,
            Stage::InProgress => self.in_progress,
            Stage::Shipped => self.shipped,
            Stage::Delivered => self.delivered,
        }
    }
}

pub fn generate_timeline(created_at: DateTime<Utc>, speed: ShippingSpeed) -> ShipmentTimeline {
    let in_progress = created_at + Duration::hours(1);

    ShipmentTimeline {
        placed: created_at,
        in_progress,
        shipped: add_business_days(in_progress, 1),
        delivered: add_business_days(in_progress, speed.transit_business_days()),
    }
}

/// Step forward `days` weekdays, keeping the time of day.
pub fn add_business_days(from: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = from;
    for _ in 0..days {
        current += Duration::days(1);
        while is_weekend(&current) {
            current += Duration::days(1);
        }
    }
    current
}

fn is_weekend(instant: &DateTime<Utc>) -> bool {
    matches!(instant.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Fixed location recorded for a stage.
pub fn stage_location(stage: Stage, shipping: &ShippingConfig) -> Option<GeoPoint> {
    match stage {
        Stage::Placed | Stage::InProgress => Some(shipping.warehouse),
        Stage::Shipped => None,
        Stage::Delivered => Some(shipping.destination),
    }
}
