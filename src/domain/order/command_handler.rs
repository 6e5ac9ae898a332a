use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ShippingConfig;
use crate::domain::notification::{Notifier, Template};
use crate::metrics::Metrics;
use crate::persistence::{carts, catalog, orders, tracking};

use super::commands::{AdvanceStatus, Checkout, PlaceOrder};
use super::errors::OrderError;
use super::stage::Stage;
use super::tracking::{furthest_completed, plan_tracking, OrderTracking};
use super::value_objects::{OrderId, OrderSummary};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Checkout:  validate → read cart → order + lines + tracking → clear cart
//            (one transaction) → notify
// Advance:   load tracking → check transition → conditional update
//            (one transaction) → notify → review requests on delivery
//
// Notifications are written after commit and never undo the change that
// produced them.
//
// ============================================================================

pub struct OrderCommandHandler {
    pool: SqlitePool,
    shipping: ShippingConfig,
    notifier: Notifier,
    metrics: Option<Arc<Metrics>>,
}

impl OrderCommandHandler {
    pub fn new(pool: SqlitePool, shipping: ShippingConfig, notifier: Notifier) -> Self {
        Self {
            pool,
            shipping,
            notifier,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn place_order(&self, command: &PlaceOrder) -> Result<OrderId, OrderError> {
        self.place_order_at(command, Utc::now()).await
    }

    /// Turn the owner's cart into an order placed at `now`.
    pub async fn place_order_at(
        &self,
        command: &PlaceOrder,
        now: DateTime<Utc>,
    ) -> Result<OrderId, OrderError> {
        let started = Instant::now();
        let checkout = match command.validate() {
            Ok(checkout) => checkout,
            Err(e) => {
                tracing::warn!(owner = %command.owner_email, error = %e, "Rejected checkout");
                self.record_rejection(&e);
                return Err(e);
            }
        };

        if let Some(existing) = self.find_replay(&checkout).await? {
            tracing::info!(
                order_id = %existing,
                owner = %checkout.owner_email,
                "Checkout replayed, returning existing order"
            );
            return Ok(existing);
        }

        self.commit_checkout(&checkout, now, started).await
    }

    /// Write the order in one transaction, then send the placed notification.
    /// A unique-key collision means a concurrent submission with the same key
    /// committed first; its order is returned instead.
    async fn commit_checkout(
        &self,
        checkout: &Checkout,
        now: DateTime<Utc>,
        started: Instant,
    ) -> Result<OrderId, OrderError> {
        let mut tx = self.pool.begin().await?;
        let order_id = match write_order(&mut tx, checkout, &self.shipping, now).await {
            Ok(order_id) => order_id,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed checkout also failed");
                }

                if is_unique_violation(&e) {
                    if let Some(existing) = self.find_replay(checkout).await? {
                        tracing::info!(
                            order_id = %existing,
                            owner = %checkout.owner_email,
                            "Lost idempotency race, returning winning order"
                        );
                        return Ok(existing);
                    }
                }

                tracing::warn!(owner = %checkout.owner_email, error = %e, "Checkout rolled back");
                self.record_rejection(&e);
                return Err(e);
            }
        };
        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            owner = %checkout.owner_email,
            shipping_speed = %checkout.shipping_speed,
            gift = checkout.gift_recipient.is_some(),
            "Order placed"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_order_placed(
                checkout.shipping_speed.as_str(),
                started.elapsed().as_secs_f64(),
            );
        }

        self.notifier
            .notify(
                &checkout.owner_email,
                Template::StageReached { order_id, stage: Stage::Placed },
                now,
            )
            .await;

        Ok(order_id)
    }

    pub async fn advance_status(&self, command: AdvanceStatus) -> Result<(), OrderError> {
        self.advance_status_at(command, Utc::now()).await
    }

    /// Complete `command.stage` at `now` if its predecessor is the furthest
    /// completed stage.
    pub async fn advance_status_at(
        &self,
        command: AdvanceStatus,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let AdvanceStatus { order_id, stage } = command;

        let mut tx = self.pool.begin().await?;
        let owner = match complete_stage(&mut tx, order_id, stage, now).await {
            Ok(owner) => owner,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed advance also failed");
                }
                tracing::warn!(order_id = %order_id, stage = %stage, error = %e, "Stage advance rejected");
                if let Some(metrics) = &self.metrics {
                    metrics.record_advance_rejected(e.kind());
                }
                return Err(e);
            }
        };
        tx.commit().await?;

        tracing::info!(order_id = %order_id, stage = %stage, "Stage completed");
        if let Some(metrics) = &self.metrics {
            metrics.record_stage_advanced(stage.as_str());
        }

        self.notifier
            .notify(&owner, Template::StageReached { order_id, stage }, now)
            .await;

        if stage == Stage::Delivered {
            self.request_reviews(order_id, &owner, now).await;
        }

        Ok(())
    }

    pub async fn get_order_tracking(&self, order_id: OrderId) -> Result<OrderTracking, OrderError> {
        let mut conn = self.pool.acquire().await?;

        let order = orders::load_order(&mut conn, order_id)
            .await?
            .ok_or_else(|| OrderError::not_found("order", order_id))?;
        let records = tracking::load_tracking(&mut conn, order_id).await?;

        Ok(OrderTracking::new(order, &records))
    }

    pub async fn list_orders(&self, owner_email: &str) -> Result<Vec<OrderSummary>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::list_orders(&mut conn, owner_email).await?)
    }

    /// Ask the owner to review each product of a delivered order they have
    /// not reviewed yet. Returns the number of requests sent.
    async fn request_reviews(&self, order_id: OrderId, owner: &str, now: DateTime<Utc>) -> usize {
        let products = {
            let mut conn = match self.pool.acquire().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Skipping review requests");
                    return 0;
                }
            };
            match unreviewed_products(&mut conn, order_id, owner).await {
                Ok(products) => products,
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Skipping review requests");
                    return 0;
                }
            }
        };

        let mut sent = 0;
        for product in &products {
            let template = Template::ReviewRequest { product, order_id };
            if self.notifier.notify(owner, template, now).await {
                sent += 1;
            }
        }

        tracing::info!(order_id = %order_id, candidates = products.len(), sent, "Requested reviews");
        sent
    }

    async fn find_replay(&self, checkout: &Checkout) -> Result<Option<OrderId>, OrderError> {
        let Some(key) = &checkout.idempotency_key else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        Ok(orders::find_by_idempotency_key(&mut conn, &checkout.owner_email, key).await?)
    }

    fn record_rejection(&self, error: &OrderError) {
        if let Some(metrics) = &self.metrics {
            metrics.record_order_rejected(error.kind());
        }
    }
}

/// All checkout writes. Runs inside the caller's transaction.
async fn write_order(
    conn: &mut SqliteConnection,
    checkout: &Checkout,
    shipping: &ShippingConfig,
    now: DateTime<Utc>,
) -> Result<OrderId, OrderError> {
    let cart = carts::read_cart(conn, &checkout.owner_email)
        .await?
        .ok_or_else(|| OrderError::not_found("cart", &checkout.owner_email))?;

    if cart.is_empty() {
        return Err(OrderError::Validation("cart is empty".to_string()));
    }

    let total = cart.total()?;
    if total != checkout.expected_total {
        return Err(OrderError::Validation(format!(
            "submitted total {} does not match cart total {}",
            checkout.expected_total, total
        )));
    }

    let order_id = orders::insert_order(conn, checkout, now, total).await?;
    orders::insert_order_lines(conn, order_id, &cart.lines).await?;

    let records = plan_tracking(order_id, now, checkout.shipping_speed, shipping);
    tracking::insert_tracking(conn, &records).await?;

    carts::clear_cart(conn, cart.cart_id).await?;

    tracing::debug!(order_id = %order_id, lines = cart.lines.len(), total = %total, "Order rows written");
    Ok(order_id)
}

/// Complete one stage and return the order owner. Runs inside the caller's
/// transaction.
async fn complete_stage(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    target: Stage,
    now: DateTime<Utc>,
) -> Result<String, OrderError> {
    let records = tracking::load_tracking(conn, order_id).await?;
    let current =
        furthest_completed(&records).ok_or_else(|| OrderError::not_found("order", order_id))?;

    Stage::validate_advance(order_id, current, target)?;

    // Another writer may have completed the stage since the read above.
    if !tracking::complete_stage(conn, order_id, target, now).await? {
        return Err(OrderError::AlreadyCompleted { order_id, stage: target });
    }

    orders::owner_of(conn, order_id)
        .await?
        .ok_or_else(|| OrderError::not_found("order", order_id))
}

/// Names of the distinct products in the order that `owner` has not reviewed.
async fn unreviewed_products(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    owner: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let product_ids: BTreeSet<i64> = orders::load_order_lines(conn, order_id)
        .await?
        .into_iter()
        .map(|line| line.product_id)
        .collect();

    let mut names = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        if catalog::has_reviewed(conn, owner, product_id).await? {
            continue;
        }
        if let Some(product) = catalog::find_product(conn, product_id).await? {
            names.push(product.name);
        }
    }
    Ok(names)
}

fn is_unique_violation(error: &OrderError) -> bool {
    match error {
        OrderError::Transaction(sqlx::Error::Database(db)) => db.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationCategory;
    use crate::domain::order::{Money, ShippingSpeed};
    use crate::persistence::seed;
    use crate::persistence::testing::{count, fail_on, memory_pool};
    use crate::utils::RetryConfig;
    use chrono::TimeZone;
    use std::time::Duration;

    const OWNER: &str = "mario@example.com";
    const CART_TOTAL: i64 = 2 * 12000 + 8999;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    async fn shop() -> (SqlitePool, OrderCommandHandler) {
        let pool = memory_pool().await;
        let retry = RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        };
        let notifier = Notifier::new(pool.clone(), retry);
        let handler = OrderCommandHandler::new(pool.clone(), ShippingConfig::default(), notifier);

        seed::upsert_product(&pool, 1, "Air Runner", Money::from_cents(12000)).await.unwrap();
        seed::upsert_product(&pool, 2, "Trail Blazer", Money::from_cents(8999)).await.unwrap();
        fill_cart(&pool).await;

        (pool, handler)
    }

    async fn fill_cart(pool: &SqlitePool) {
        let cart_id = seed::create_cart(pool, OWNER).await.unwrap();
        seed::add_to_cart(pool, cart_id, 1, "red", "42", 2).await.unwrap();
        seed::add_to_cart(pool, cart_id, 2, "black", "43", 1).await.unwrap();
    }

    fn checkout() -> PlaceOrder {
        PlaceOrder {
            owner_email: OWNER.to_string(),
            total: Money::from_cents(CART_TOTAL),
            payment_method: "Credit Card".to_string(),
            shipping_speed: ShippingSpeed::Standard,
            is_gift: false,
            gift_first_name: None,
            gift_last_name: None,
            street: "Via Roma".to_string(),
            city: "Milano".to_string(),
            civic_number: "10".to_string(),
            postal_code: "20121".to_string(),
            idempotency_key: None,
        }
    }

    async fn cart_lines(pool: &SqlitePool) -> usize {
        let mut conn = pool.acquire().await.unwrap();
        carts::read_cart(&mut conn, OWNER).await.unwrap().unwrap().lines.len()
    }

    async fn messages(handler: &OrderCommandHandler, category: NotificationCategory) -> Vec<String> {
        handler
            .notifier
            .notifications_for(OWNER)
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.category == category)
            .map(|n| n.message)
            .collect()
    }

    fn advance(order_id: OrderId, stage: Stage) -> AdvanceStatus {
        AdvanceStatus { order_id, stage }
    }

    #[tokio::test]
    async fn test_place_order_writes_order_lines_and_tracking() {
        let (pool, handler) = shop().await;

        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();

        assert_eq!(count(&pool, "orders").await, 1);
        assert_eq!(count(&pool, "order_items").await, 2);
        assert_eq!(count(&pool, "order_tracking").await, 4);

        let view = handler.get_order_tracking(order_id).await.unwrap();
        assert_eq!(view.order.total_cost, Money::from_cents(CART_TOTAL));
        assert_eq!(view.order.lines.len(), 2);
        assert_eq!(view.current_stage(), Some(Stage::Placed));
        assert_eq!(view.stages[0].actual_arrival, Some(at(16, 10)));
        assert_eq!(view.stages[0].location, Some(ShippingConfig::default().warehouse));
        assert_eq!(view.stages[1].estimated_arrival, Some(at(16, 11)));
        assert_eq!(view.stages[2].estimated_arrival, Some(at(19, 11)));
        assert_eq!(view.stages[3].estimated_arrival, Some(at(23, 11)));
        assert!(view.stages[1..].iter().all(|s| !s.is_reached() && s.location.is_none()));

        let placed = messages(&handler, NotificationCategory::OrderStatus).await;
        assert_eq!(placed, vec![format!("Your order #{order_id} has been placed successfully!")]);
    }

    #[tokio::test]
    async fn test_checkout_clears_cart() {
        let (pool, handler) = shop().await;

        handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let cart = carts::read_cart(&mut conn, OWNER).await.unwrap().unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.cached_total, Money::ZERO);
    }

    #[tokio::test]
    async fn test_purchase_price_is_frozen() {
        let (pool, handler) = shop().await;
        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();

        seed::upsert_product(&pool, 1, "Air Runner", Money::from_cents(5000)).await.unwrap();

        let view = handler.get_order_tracking(order_id).await.unwrap();
        let runner = view.order.lines.iter().find(|line| line.product_id == 1).unwrap();
        assert_eq!(runner.purchase_price, Money::from_cents(12000));
        assert_eq!(runner.quantity, 2);
        assert_eq!(view.order.total_cost, Money::from_cents(CART_TOTAL));
    }

    #[tokio::test]
    async fn test_failed_checkout_leaves_no_trace() {
        let failure_points = [
            ("fail_items", "BEFORE INSERT ON order_items"),
            ("fail_tracking", "BEFORE INSERT ON order_tracking"),
            ("fail_clear", "BEFORE DELETE ON cart_items"),
        ];

        for (name, timing) in failure_points {
            let (pool, handler) = shop().await;
            fail_on(&pool, name, timing).await;

            let result = handler.place_order_at(&checkout(), at(16, 10)).await;

            assert!(matches!(result, Err(OrderError::Transaction(_))), "{name}: {result:?}");
            assert_eq!(count(&pool, "orders").await, 0, "{name}");
            assert_eq!(count(&pool, "order_items").await, 0, "{name}");
            assert_eq!(count(&pool, "order_tracking").await, 0, "{name}");
            assert_eq!(count(&pool, "notifications").await, 0, "{name}");
            assert_eq!(cart_lines(&pool).await, 2, "{name}");
        }
    }

    #[tokio::test]
    async fn test_total_mismatch_is_rejected() {
        let (pool, handler) = shop().await;
        let metrics = Arc::new(Metrics::new().unwrap());
        let handler = handler.with_metrics(metrics.clone());
        let mut command = checkout();
        command.total = Money::from_cents(100);

        let result = handler.place_order_at(&command, at(16, 10)).await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
        assert_eq!(count(&pool, "orders").await, 0);
        assert_eq!(cart_lines(&pool).await, 2);
        assert_eq!(metrics.orders_rejected.with_label_values(&["validation"]).get(), 1);
    }

    #[tokio::test]
    async fn test_missing_cart_is_not_found() {
        let (_pool, handler) = shop().await;
        let mut command = checkout();
        command.owner_email = "luigi@example.com".to_string();

        let result = handler.place_order_at(&command, at(16, 10)).await;

        assert!(matches!(result, Err(OrderError::NotFound { entity: "cart", .. })));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let (_pool, handler) = shop().await;
        handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();

        let mut command = checkout();
        command.total = Money::ZERO;
        let result = handler.place_order_at(&command, at(16, 12)).await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[tokio::test]
    async fn test_gift_order_keeps_recipient() {
        let (_pool, handler) = shop().await;
        let mut command = checkout();
        command.is_gift = true;
        command.gift_first_name = Some("Luigi".to_string());
        command.gift_last_name = Some("Verdi".to_string());

        let order_id = handler.place_order_at(&command, at(16, 10)).await.unwrap();

        let view = handler.get_order_tracking(order_id).await.unwrap();
        assert!(view.order.is_gift());
        assert_eq!(view.order.gift_recipient.unwrap().full_name(), "Luigi Verdi");
    }

    #[tokio::test]
    async fn test_replayed_checkout_returns_same_order() {
        let (pool, handler) = shop().await;
        let mut command = checkout();
        command.idempotency_key = Some("checkout-1".to_string());

        let first = handler.place_order_at(&command, at(16, 10)).await.unwrap();
        let second = handler.place_order_at(&command, at(16, 10)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(count(&pool, "orders").await, 1);
        assert_eq!(count(&pool, "notifications").await, 1);
    }

    #[tokio::test]
    async fn test_checkout_losing_key_race_returns_winner() {
        let (pool, handler) = shop().await;
        let mut command = checkout();
        command.idempotency_key = Some("checkout-1".to_string());
        let pending = command.validate().unwrap();

        // The competing submission commits after the pre-check has passed.
        let winner = {
            let mut conn = pool.acquire().await.unwrap();
            orders::insert_order(&mut conn, &pending, at(16, 9), Money::from_cents(CART_TOTAL))
                .await
                .unwrap()
        };

        let result = handler.commit_checkout(&pending, at(16, 10), Instant::now()).await.unwrap();

        assert_eq!(result, winner);
        assert_eq!(count(&pool, "orders").await, 1);
        assert_eq!(count(&pool, "order_items").await, 0);
        assert_eq!(count(&pool, "order_tracking").await, 0);
        assert_eq!(count(&pool, "notifications").await, 0);
        assert_eq!(cart_lines(&pool).await, 2);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_order() {
        let (pool, handler) = shop().await;
        fail_on(&pool, "no_notifications", "BEFORE INSERT ON notifications").await;

        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();
        handler.advance_status_at(advance(order_id, Stage::InProgress), at(16, 11)).await.unwrap();

        assert_eq!(count(&pool, "orders").await, 1);
        assert_eq!(cart_lines(&pool).await, 0);
        let view = handler.get_order_tracking(order_id).await.unwrap();
        assert_eq!(view.current_stage(), Some(Stage::InProgress));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (_pool, handler) = shop().await;
        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();

        handler.advance_status_at(advance(order_id, Stage::InProgress), at(16, 11)).await.unwrap();
        handler.advance_status_at(advance(order_id, Stage::Shipped), at(19, 9)).await.unwrap();
        handler.advance_status_at(advance(order_id, Stage::Delivered), at(22, 15)).await.unwrap();

        let view = handler.get_order_tracking(order_id).await.unwrap();
        assert_eq!(view.current_stage(), Some(Stage::Delivered));
        assert_eq!(view.stages[2].actual_arrival, Some(at(19, 9)));
        assert_eq!(view.stages[2].location, None);
        assert_eq!(view.stages[3].actual_arrival, Some(at(22, 15)));
        assert_eq!(view.stages[3].location, Some(ShippingConfig::default().destination));
        assert_eq!(view.stages[3].estimated_arrival, Some(at(23, 11)));

        assert_eq!(messages(&handler, NotificationCategory::OrderStatus).await.len(), 4);
        let reviews = messages(&handler, NotificationCategory::ReviewRequest).await;
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().any(|m| m.contains("Air Runner")));
        assert!(reviews.iter().any(|m| m.contains("Trail Blazer")));
    }

    #[tokio::test]
    async fn test_skipping_a_stage_is_rejected() {
        let (pool, handler) = shop().await;
        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();
        let before = handler.get_order_tracking(order_id).await.unwrap();

        let result = handler.advance_status_at(advance(order_id, Stage::Delivered), at(17, 10)).await;

        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition { current: Stage::Placed, target: Stage::Delivered, .. })
        ));
        let after = handler.get_order_tracking(order_id).await.unwrap();
        assert_eq!(before, after);
        assert_eq!(count(&pool, "notifications").await, 1);
    }

    #[tokio::test]
    async fn test_repeated_advance_notifies_once() {
        let (_pool, handler) = shop().await;
        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();

        handler.advance_status_at(advance(order_id, Stage::InProgress), at(16, 11)).await.unwrap();
        let again = handler.advance_status_at(advance(order_id, Stage::InProgress), at(16, 12)).await;
        let placed = handler.advance_status_at(advance(order_id, Stage::Placed), at(16, 12)).await;

        assert!(matches!(again, Err(OrderError::AlreadyCompleted { stage: Stage::InProgress, .. })));
        assert!(matches!(placed, Err(OrderError::AlreadyCompleted { stage: Stage::Placed, .. })));

        let view = handler.get_order_tracking(order_id).await.unwrap();
        assert_eq!(view.stages[1].actual_arrival, Some(at(16, 11)));
        let prepared = messages(&handler, NotificationCategory::OrderStatus)
            .await
            .into_iter()
            .filter(|m| m.contains("being prepared"))
            .count();
        assert_eq!(prepared, 1);
    }

    #[tokio::test]
    async fn test_advance_unknown_order() {
        let (_pool, handler) = shop().await;

        let result = handler.advance_status_at(advance(OrderId(404), Stage::InProgress), at(16, 11)).await;

        assert!(matches!(result, Err(OrderError::NotFound { entity: "order", .. })));
        assert!(matches!(
            handler.get_order_tracking(OrderId(404)).await,
            Err(OrderError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_review_requests_skip_reviewed_products() {
        let (pool, handler) = shop().await;
        let order_id = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();
        seed::add_review(&pool, OWNER, 1, 5, Some("Great fit")).await.unwrap();

        for stage in [Stage::InProgress, Stage::Shipped, Stage::Delivered] {
            handler.advance_status_at(advance(order_id, stage), at(20, 10)).await.unwrap();
        }

        let reviews = messages(&handler, NotificationCategory::ReviewRequest).await;
        assert_eq!(reviews.len(), 1);
        assert!(reviews[0].contains("Trail Blazer"));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let (pool, handler) = shop().await;
        let first = handler.place_order_at(&checkout(), at(16, 10)).await.unwrap();
        fill_cart(&pool).await;
        let mut command = checkout();
        command.shipping_speed = ShippingSpeed::Express;
        let second = handler.place_order_at(&command, at(17, 10)).await.unwrap();

        let history = handler.list_orders(OWNER).await.unwrap();

        assert_eq!(history.iter().map(|o| o.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(history[0].shipping_speed, ShippingSpeed::Express);
        assert!(handler.list_orders("luigi@example.com").await.unwrap().is_empty());
    }
}
