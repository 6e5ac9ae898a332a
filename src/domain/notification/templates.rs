use crate::domain::order::{Money, OrderId, Stage};
use super::value_objects::NotificationCategory;

// ============================================================================
// Notification Templates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Template<'a> {
    /// A tracking stage was reached; Placed doubles as the checkout message.
    StageReached { order_id: OrderId, stage: Stage },
    FlashSale { product: &'a str, old_price: Money, new_price: Money },
    BackInStock { product: &'a str, color: &'a str, size: &'a str },
    ReviewRequest { product: &'a str, order_id: OrderId },
}

impl Template<'_> {
    pub fn category(&self) -> NotificationCategory {
        match self {
            Template::StageReached { .. } => NotificationCategory::OrderStatus,
            Template::FlashSale { .. } => NotificationCategory::FlashSale,
            Template::BackInStock { .. } => NotificationCategory::StockProduct,
            Template::ReviewRequest { .. } => NotificationCategory::ReviewRequest,
        }
    }

    pub fn render(&self) -> String {
        match *self {
            Template::StageReached { order_id, stage } => match stage {
                Stage::Placed => format!("Your order #{order_id} has been placed successfully!"),
                Stage::InProgress => format!("Your order #{order_id} is being prepared at our warehouse."),
                Stage::Shipped => format!("Good news! Your order #{order_id} has been shipped."),
                Stage::Delivered => {
                    format!("Your order #{order_id} has been delivered. Enjoy your new shoes!")
                }
            },
            Template::FlashSale { product, old_price, new_price } => {
                format!("Flash sale! {product} dropped from {old_price} to {new_price}.")
            }
            Template::BackInStock { product, color, size } => {
                format!("{product} in {color}, size {size}, is back in stock!")
            }
            Template::ReviewRequest { product, order_id } => {
                format!("How are your {product} from order #{order_id}? Leave a review!")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_stage_has_a_message() {
        let messages: Vec<String> = Stage::ALL
            .iter()
            .map(|stage| Template::StageReached { order_id: OrderId(42), stage: *stage }.render())
            .collect();

        assert!(messages.iter().all(|message| message.contains("#42")));
        assert_eq!(messages[0], "Your order #42 has been placed successfully!");
        let unique: HashSet<&str> = messages.iter().map(String::as_str).collect();
        assert_eq!(unique.len(), Stage::ALL.len());
    }

    #[test]
    fn test_flash_sale_message() {
        let template = Template::FlashSale {
            product: "Air Runner",
            old_price: Money::from_cents(12000),
            new_price: Money::from_cents(9000),
        };

        assert_eq!(template.category(), NotificationCategory::FlashSale);
        assert_eq!(template.render(), "Flash sale! Air Runner dropped from €120.00 to €90.00.");
    }

    #[test]
    fn test_categories() {
        let stock = Template::BackInStock { product: "Trail", color: "blue", size: "43" };
        let review = Template::ReviewRequest { product: "Trail", order_id: OrderId(1) };

        assert_eq!(stock.category(), NotificationCategory::StockProduct);
        assert_eq!(review.category(), NotificationCategory::ReviewRequest);
        assert_eq!(stock.render(), "Trail in blue, size 43, is back in stock!");
    }
}
