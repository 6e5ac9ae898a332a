use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ShippingConfig;
use super::stage::Stage;
use super::timeline::{generate_timeline, stage_location};
use super::value_objects::{GeoPoint, Order, OrderId, ShippingSpeed};

// ============================================================================
// Tracking Records & Read Projection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub order_id: OrderId,
    pub stage: Stage,
    pub location: Option<GeoPoint>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub estimated_arrival: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl TrackingRecord {
    pub fn is_completed(&self) -> bool {
        self.actual_arrival.is_some()
    }
}

/// The four records written at checkout. Only Placed starts completed.
pub fn plan_tracking(
    order_id: OrderId,
    created_at: DateTime<Utc>,
    speed: ShippingSpeed,
    shipping: &ShippingConfig,
) -> [TrackingRecord; 4] {
    let timeline = generate_timeline(created_at, speed);

    Stage::ALL.map(|stage| TrackingRecord {
        order_id,
        stage,
        location: stage_location(stage, shipping),
        actual_arrival: (stage == Stage::Placed).then_some(created_at),
        estimated_arrival: timeline.estimated_arrival(stage),
        last_updated: created_at,
    })
}

/// Furthest stage with an actual arrival, if any.
pub fn furthest_completed(records: &[TrackingRecord]) -> Option<Stage> {
    records
        .iter()
        .filter(|record| record.is_completed())
        .map(|record| record.stage)
        .max()
}

/// One slot of the fixed four-step progress view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    pub stage: Stage,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    /// Only exposed once the stage is reached.
    pub location: Option<GeoPoint>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StageState {
    fn empty(stage: Stage) -> Self {
        Self {
            stage,
            estimated_arrival: None,
            actual_arrival: None,
            location: None,
            last_updated: None,
        }
    }

    pub fn is_reached(&self) -> bool {
        self.actual_arrival.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTracking {
    pub order: Order,
    pub stages: [StageState; 4],
}

impl OrderTracking {
    pub fn new(order: Order, records: &[TrackingRecord]) -> Self {
        let stages = Stage::ALL.map(|stage| {
            match records.iter().find(|record| record.stage == stage) {
                Some(record) => StageState {
                    stage,
                    estimated_arrival: Some(record.estimated_arrival),
                    actual_arrival: record.actual_arrival,
                    location: record.actual_arrival.and(record.location),
                    last_updated: Some(record.last_updated),
                },
                None => StageState::empty(stage),
            }
        });

        Self { order, stages }
    }

    pub fn current_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .filter(|state| state.is_reached())
            .map(|state| state.stage)
            .max()
    }
}
