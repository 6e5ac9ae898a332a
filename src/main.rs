use actix::prelude::*;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod config;
mod domain;
mod metrics;
mod persistence;
mod utils;

use actors::{
    AdvanceOrder, CoordinatorActor, GetCatalogHandler, GetDlqActor, GetDlqMessages, GetDlqStats,
    GetInbox, GetOrderActor, GetOrderTracking, ListOrders, MarkNotificationRead, Shutdown,
    SubmitCheckout,
};
use domain::order::{AdvanceStatus, Money, OrderError, PlaceOrder, ShippingSpeed, Stage};
use persistence::seed;

const DEMO_CUSTOMER: &str = "mario.rossi@example.com";

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shoeshop_orders=debug"))
        )
        .init();

    tracing::info!("🚀 Starting shoe shop order service");

    let config = config::AppConfig::load()?;

    // === 1. Open the database ===
    let pool = persistence::connect(&config.database).await?;
    persistence::init_schema(&pool).await?;

    // === 2. Initialize Prometheus metrics ===
    tracing::info!("Initializing metrics");
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    if config.metrics.enabled {
        // Metrics HTTP server runs on its own thread and actix system
        let server_metrics = metrics.clone();
        let port = config.metrics.port;
        std::thread::spawn(move || {
            let system = actix_web::rt::System::new();
            if let Err(e) = system.block_on(metrics::start_metrics_server(server_metrics, port)) {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    }

    // === 3. Storefront data for the demo ===
    seed_storefront(&pool).await?;

    // === 4. Start Coordinator Actor ===
    tracing::info!("Starting coordinator actor with supervision");
    let coordinator = CoordinatorActor::new(pool.clone(), config.clone(), metrics.clone()).start();

    let order_actor = coordinator
        .send(GetOrderActor)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order actor was not started"))?;
    let catalog = coordinator
        .send(GetCatalogHandler)
        .await?
        .ok_or_else(|| anyhow::anyhow!("catalog handler was not started"))?;

    // === 5. Checkout ===
    tracing::info!("📝 Demonstrating checkout and shipment tracking");

    let client_total = {
        let mut conn = pool.acquire().await?;
        persistence::carts::read_cart(&mut conn, DEMO_CUSTOMER)
            .await?
            .map(|cart| cart.total())
            .transpose()?
            .unwrap_or(Money::ZERO)
    };

    let order_id = order_actor
        .send(SubmitCheckout(PlaceOrder {
            owner_email: DEMO_CUSTOMER.to_string(),
            total: client_total,
            payment_method: "Credit Card".to_string(),
            shipping_speed: ShippingSpeed::Standard,
            is_gift: true,
            gift_first_name: Some("Luigi".to_string()),
            gift_last_name: Some("Rossi".to_string()),
            street: "Via Torino".to_string(),
            city: "Milano".to_string(),
            civic_number: "21".to_string(),
            postal_code: "20123".to_string(),
            idempotency_key: Some(uuid::Uuid::new_v4().to_string()),
        }))
        .await??;

    tracing::info!(order_id = %order_id, total = %client_total, "✅ Order placed");

    // === 6. Walk the order through its stages ===
    for stage in [Stage::InProgress, Stage::Shipped, Stage::Delivered] {
        order_actor
            .send(AdvanceOrder(AdvanceStatus { order_id, stage }))
            .await??;
    }

    // Re-sending a completed stage is refused and notifies nobody
    match order_actor
        .send(AdvanceOrder(AdvanceStatus { order_id, stage: Stage::Delivered }))
        .await?
    {
        Err(e @ OrderError::AlreadyCompleted { .. }) => {
            tracing::info!(error = %e, "Duplicate stage update rejected");
        }
        other => tracing::warn!(result = ?other, "Unexpected result for duplicate stage update"),
    }

    let tracking = order_actor.send(GetOrderTracking { order_id }).await??;
    for state in &tracking.stages {
        tracing::info!(
            stage = %state.stage,
            estimated = ?state.estimated_arrival,
            actual = ?state.actual_arrival,
            location = ?state.location,
            "📦 Tracking"
        );
    }

    let history = order_actor
        .send(ListOrders { owner_email: DEMO_CUSTOMER.to_string() })
        .await??;
    tracing::info!(orders = history.len(), "Order history loaded");

    // === 7. Catalog changes that fan out to wishlists ===
    let flash_sale = catalog.update_price(3, Money::from_cents(6999)).await?;
    catalog.update_stock(3, "green", "40", 0).await?;
    let back_in_stock = catalog.update_stock(3, "green", "40", 4).await?;
    tracing::info!(flash_sale, back_in_stock, "Catalog notifications sent");

    let inbox = order_actor
        .send(GetInbox { owner_email: DEMO_CUSTOMER.to_string() })
        .await??;
    for notification in inbox.iter().take(10) {
        tracing::info!(category = %notification.category, "🔔 {}", notification.message);
    }

    if let Some(newest) = inbox.first() {
        let marked = order_actor
            .send(MarkNotificationRead { notification_id: newest.id })
            .await??;
        tracing::info!(notification_id = newest.id, marked, "Newest notification marked read");
    }

    if let Some(dlq) = coordinator.send(GetDlqActor).await? {
        match dlq.send(GetDlqStats).await? {
            Ok(stats) => tracing::info!(
                total = stats.total_messages,
                by_category = ?stats.by_category,
                "💀 Dead letter queue"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to read dead letter queue stats"),
        }

        match dlq.send(GetDlqMessages { limit: 20 }).await? {
            Ok(messages) => {
                for message in &messages {
                    tracing::warn!(
                        recipient = %message.recipient_email,
                        category = %message.category,
                        failure_count = message.failure_count,
                        error = %message.error_message,
                        "💀 Undelivered: {}",
                        message.payload
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to list dead letter queue"),
        }
    }

    coordinator
        .send(Shutdown)
        .await?
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("🎉 Demo complete!");

    Ok(())
}

async fn seed_storefront(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    seed::upsert_product(pool, 1, "Air Runner", Money::from_cents(12000)).await?;
    seed::upsert_product(pool, 2, "Trail Blazer", Money::from_cents(8999)).await?;
    seed::upsert_product(pool, 3, "City Loafer", Money::from_cents(9999)).await?;

    let cart_id = seed::create_cart(pool, DEMO_CUSTOMER).await?;
    seed::add_to_cart(pool, cart_id, 1, "red", "42", 2).await?;
    seed::add_to_cart(pool, cart_id, 2, "black", "43", 1).await?;
    seed::add_to_wishlist(pool, DEMO_CUSTOMER, 3).await?;

    tracing::info!(customer = DEMO_CUSTOMER, cart_id, "Seeded storefront data");
    Ok(())
}
