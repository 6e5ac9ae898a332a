use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;
use super::value_objects::OrderId;

// ============================================================================
// Shipment Stage State Machine
// ============================================================================
//
//   Placed ──► InProgress ──► Shipped ──► Delivered
//
// Placed is completed when the order is created. Every other stage can only
// be completed when its predecessor is.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Placed,
    InProgress,
    Shipped,
    Delivered,
}

/// Allowed (from, to) pairs.
const TRANSITIONS: [(Stage, Stage); 3] = [
    (Stage::Placed, Stage::InProgress),
    (Stage::InProgress, Stage::Shipped),
    (Stage::Shipped, Stage::Delivered),
];

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Placed,
        Stage::InProgress,
        Stage::Shipped,
        Stage::Delivered,
    ];

    pub fn successor(self) -> Option<Stage> {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
    }

    pub fn predecessor(self) -> Option<Stage> {
        TRANSITIONS
            .iter()
            .find(|(_, to)| *to == self)
            .map(|(from, _)| *from)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Placed => "placed",
            Stage::InProgress => "in_progress",
            Stage::Shipped => "shipped",
            Stage::Delivered => "delivered",
        }
    }

    /// Check that `target` may be completed when `current` is the furthest
    /// completed stage of an order.
    pub fn validate_advance(order_id: OrderId, current: Stage, target: Stage) -> Result<(), OrderError> {
        if target <= current {
            return Err(OrderError::AlreadyCompleted { order_id, stage: target });
        }

        if current.successor() == Some(target) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition { order_id, current, target })
        }
    }
}

impl FromStr for Stage {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Stage::Placed),
            "in_progress" => Ok(Stage::InProgress),
            "shipped" => Ok(Stage::Shipped),
            "delivered" => Ok(Stage::Delivered),
            other => Err(OrderError::Validation(format!("unknown stage: {other}"))),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: OrderId = OrderId(7);

    #[test]
    fn test_stage_order() {
        assert!(Stage::Placed < Stage::InProgress);
        assert!(Stage::Shipped < Stage::Delivered);
        assert!(Stage::ALL.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_successor_and_predecessor() {
        assert_eq!(Stage::Placed.successor(), Some(Stage::InProgress));
        assert_eq!(Stage::Delivered.successor(), None);
        assert_eq!(Stage::Placed.predecessor(), None);
        assert_eq!(Stage::Delivered.predecessor(), Some(Stage::Shipped));
    }

    #[test]
    fn test_string_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert!("lost".parse::<Stage>().is_err());
    }

    #[test]
    fn test_advance_to_successor() {
        assert!(Stage::validate_advance(ORDER, Stage::Placed, Stage::InProgress).is_ok());
        assert!(Stage::validate_advance(ORDER, Stage::Shipped, Stage::Delivered).is_ok());
    }

    #[test]
    fn test_cannot_skip_stages() {
        let result = Stage::validate_advance(ORDER, Stage::Placed, Stage::Delivered);
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition {
                current: Stage::Placed,
                target: Stage::Delivered,
                ..
            })
        ));
    }

    #[test]
    fn test_completed_stage_is_rejected() {
        let result = Stage::validate_advance(ORDER, Stage::Shipped, Stage::Shipped);
        assert!(matches!(result, Err(OrderError::AlreadyCompleted { stage: Stage::Shipped, .. })));

        let result = Stage::validate_advance(ORDER, Stage::Shipped, Stage::Placed);
        assert!(matches!(result, Err(OrderError::AlreadyCompleted { stage: Stage::Placed, .. })));
    }
}
