use actix::prelude::*;
use std::sync::Arc;

use crate::domain::notification::{Notification, NotifyError};
use crate::domain::order::{
    AdvanceStatus, OrderCommandHandler, OrderError, OrderId, OrderSummary, OrderTracking,
    PlaceOrder,
};

// ============================================================================
// Actor Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Result<OrderId, OrderError>")]
pub struct SubmitCheckout(pub PlaceOrder);

#[derive(Message)]
#[rtype(result = "Result<(), OrderError>")]
pub struct AdvanceOrder(pub AdvanceStatus);

#[derive(Message)]
#[rtype(result = "Result<OrderTracking, OrderError>")]
pub struct GetOrderTracking {
    pub order_id: OrderId,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<OrderSummary>, OrderError>")]
pub struct ListOrders {
    pub owner_email: String,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<Notification>, NotifyError>")]
pub struct GetInbox {
    pub owner_email: String,
}

/// Resolves to false when no such notification exists.
#[derive(Message)]
#[rtype(result = "Result<bool, NotifyError>")]
pub struct MarkNotificationRead {
    pub notification_id: i64,
}

// ============================================================================
// Order Actor - Entry point for checkout, stage updates and tracking reads
// ============================================================================

pub struct OrderActor {
    handler: Arc<OrderCommandHandler>,
}

impl OrderActor {
    pub fn new(handler: Arc<OrderCommandHandler>) -> Self {
        Self { handler }
    }
}

impl Actor for OrderActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("OrderActor started");
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<SubmitCheckout> for OrderActor {
    type Result = ResponseFuture<Result<OrderId, OrderError>>;

    fn handle(&mut self, msg: SubmitCheckout, _: &mut Self::Context) -> Self::Result {
        let handler = self.handler.clone();

        tracing::debug!(owner = %msg.0.owner_email, "Received checkout");

        Box::pin(async move { handler.place_order(&msg.0).await })
    }
}

impl Handler<AdvanceOrder> for OrderActor {
    type Result = ResponseFuture<Result<(), OrderError>>;

    fn handle(&mut self, msg: AdvanceOrder, _: &mut Self::Context) -> Self::Result {
        let handler = self.handler.clone();

        tracing::debug!(order_id = %msg.0.order_id, stage = %msg.0.stage, "Received stage update");

        Box::pin(async move { handler.advance_status(msg.0).await })
    }
}

impl Handler<GetOrderTracking> for OrderActor {
    type Result = ResponseFuture<Result<OrderTracking, OrderError>>;

    fn handle(&mut self, msg: GetOrderTracking, _: &mut Self::Context) -> Self::Result {
        let handler = self.handler.clone();

        Box::pin(async move { handler.get_order_tracking(msg.order_id).await })
    }
}

impl Handler<ListOrders> for OrderActor {
    type Result = ResponseFuture<Result<Vec<OrderSummary>, OrderError>>;

    fn handle(&mut self, msg: ListOrders, _: &mut Self::Context) -> Self::Result {
        let handler = self.handler.clone();

        Box::pin(async move { handler.list_orders(&msg.owner_email).await })
    }
}

impl Handler<GetInbox> for OrderActor {
    type Result = ResponseFuture<Result<Vec<Notification>, NotifyError>>;

    fn handle(&mut self, msg: GetInbox, _: &mut Self::Context) -> Self::Result {
        let handler = self.handler.clone();

        Box::pin(async move { handler.notifier().notifications_for(&msg.owner_email).await })
    }
}

impl Handler<MarkNotificationRead> for OrderActor {
    type Result = ResponseFuture<Result<bool, NotifyError>>;

    fn handle(&mut self, msg: MarkNotificationRead, _: &mut Self::Context) -> Self::Result {
        let handler = self.handler.clone();

        Box::pin(async move { handler.notifier().mark_read(msg.notification_id).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShippingConfig;
    use crate::domain::notification::{Notifier, ReadState};
    use crate::domain::order::{Money, ShippingSpeed, Stage};
    use crate::persistence::seed;
    use crate::persistence::testing::memory_pool;
    use crate::utils::RetryConfig;

    #[actix::test]
    async fn test_checkout_and_advance_through_mailbox() {
        let pool = memory_pool().await;
        seed::upsert_product(&pool, 1, "Air Runner", Money::from_cents(12000)).await.unwrap();
        let cart_id = seed::create_cart(&pool, "mario@example.com").await.unwrap();
        seed::add_to_cart(&pool, cart_id, 1, "white", "41", 1).await.unwrap();

        let notifier = Notifier::new(pool.clone(), RetryConfig::default());
        let handler = OrderCommandHandler::new(pool, ShippingConfig::default(), notifier);
        let actor = OrderActor::new(Arc::new(handler)).start();

        let order_id = actor
            .send(SubmitCheckout(PlaceOrder {
                owner_email: "mario@example.com".to_string(),
                total: Money::from_cents(12000),
                payment_method: "PayPal".to_string(),
                shipping_speed: ShippingSpeed::Express,
                is_gift: false,
                gift_first_name: None,
                gift_last_name: None,
                street: "Via Roma".to_string(),
                city: "Milano".to_string(),
                civic_number: "1".to_string(),
                postal_code: "20121".to_string(),
                idempotency_key: None,
            }))
            .await
            .unwrap()
            .unwrap();

        actor
            .send(AdvanceOrder(AdvanceStatus { order_id, stage: Stage::InProgress }))
            .await
            .unwrap()
            .unwrap();

        let tracking = actor.send(GetOrderTracking { order_id }).await.unwrap().unwrap();
        assert_eq!(tracking.current_stage(), Some(Stage::InProgress));

        let history = actor
            .send(ListOrders { owner_email: "mario@example.com".to_string() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(history.len(), 1);

        let inbox = actor
            .send(GetInbox { owner_email: "mario@example.com".to_string() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inbox.len(), 2);

        let newest = inbox[0].id;
        assert!(actor.send(MarkNotificationRead { notification_id: newest }).await.unwrap().unwrap());
        assert!(!actor.send(MarkNotificationRead { notification_id: 9_999 }).await.unwrap().unwrap());

        let inbox = actor
            .send(GetInbox { owner_email: "mario@example.com".to_string() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inbox[0].read_state, ReadState::Read);
        assert_eq!(inbox[1].read_state, ReadState::Unread);
    }
}
