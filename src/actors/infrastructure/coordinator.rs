use actix::prelude::*;
use kameo::actor::ActorRef;
use kameo::Actor as _;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::HealthStatus;
use crate::actors::order_actor::OrderActor;
use crate::config::AppConfig;
use crate::domain::catalog::CatalogCommandHandler;
use crate::domain::notification::Notifier;
use crate::domain::order::OrderCommandHandler;
use crate::metrics::Metrics;
use super::{DlqActor, GetSystemHealth, HealthMonitorActor, UpdateHealth};

// ============================================================================
// Coordinator Actor - Orchestrates all system actors
// ============================================================================
//
// Responsibilities:
// - Wires the notifier and command handlers to the shared pool
// - Manages lifecycle of child actors (OrderActor, DlqActor, HealthMonitor)
// - Coordinates graceful shutdown
// - Reports system health
//
// Actor Hierarchy:
//   CoordinatorActor (Supervisor)
//   ├── OrderActor
//   ├── DlqActor
//   └── HealthMonitorActor (kameo)
//
// ============================================================================

pub struct CoordinatorActor {
    pool: SqlitePool,
    config: AppConfig,
    metrics: Arc<Metrics>,
    order_actor: Option<Addr<OrderActor>>,
    dlq_actor: Option<Addr<DlqActor>>,
    health_monitor: Option<ActorRef<HealthMonitorActor>>,
    catalog: Option<Arc<CatalogCommandHandler>>,
}

impl CoordinatorActor {
    pub fn new(pool: SqlitePool, config: AppConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            pool,
            config,
            metrics,
            order_actor: None,
            dlq_actor: None,
            health_monitor: None,
            catalog: None,
        }
    }

    fn start_child_actors(&mut self, _ctx: &mut Context<Self>) {
        tracing::info!("Starting supervised child actors");

        // Start health monitor actor
        let check_interval = Duration::from_secs(self.config.health.check_interval_secs.max(1));
        let health_monitor =
            HealthMonitorActor::spawn(HealthMonitorActor::new(self.pool.clone(), check_interval));
        self.health_monitor = Some(health_monitor.clone());

        // Start DLQ actor
        let dlq_actor = DlqActor::new(self.pool.clone()).start();
        self.dlq_actor = Some(dlq_actor.clone());

        let notifier = Notifier::new(self.pool.clone(), self.config.notifications.retry_config())
            .with_dlq(dlq_actor)
            .with_metrics(self.metrics.clone());

        let orders = OrderCommandHandler::new(
            self.pool.clone(),
            self.config.shipping.clone(),
            notifier.clone(),
        )
        .with_metrics(self.metrics.clone());
        self.order_actor = Some(OrderActor::new(Arc::new(orders)).start());

        self.catalog = Some(Arc::new(CatalogCommandHandler::new(self.pool.clone(), notifier)));

        // Report child actor health
        actix::spawn(async move {
            for component in ["dlq_actor", "order_actor"] {
                let update = UpdateHealth {
                    component: component.to_string(),
                    status: HealthStatus::Healthy,
                    details: Some(format!("{component} started")),
                };
                if health_monitor.tell(update).await.is_err() {
                    tracing::warn!(component, "Failed to report health");
                }
            }
        });

        tracing::info!("✅ All supervised actors started successfully");
    }
}

impl Actor for CoordinatorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🎯 CoordinatorActor started - order placement and tracking");
        self.start_child_actors(ctx);

        // Schedule periodic health checks
        let interval = Duration::from_secs(self.config.health.check_interval_secs.max(1) * 3);
        ctx.run_interval(interval, |act, _ctx| {
            let Some(health_monitor) = act.health_monitor.clone() else {
                return;
            };
            let metrics = act.metrics.clone();

            actix::spawn(async move {
                match health_monitor.ask(GetSystemHealth).await {
                    Ok(health) => {
                        metrics.set_health_status(health.overall_status.gauge_value());
                        match health.overall_status {
                            HealthStatus::Healthy => {
                                tracing::debug!("System health check: Healthy");
                            }
                            HealthStatus::Degraded(ref msg) => {
                                tracing::warn!("System health check: Degraded - {}", msg);
                            }
                            HealthStatus::Unhealthy(ref msg) => {
                                tracing::error!("System health check: Unhealthy - {}", msg);
                            }
                        }
                    }
                    Err(_) => {
                        tracing::error!("Failed to get system health");
                    }
                }
            });
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("🛑 CoordinatorActor stopping - initiating graceful shutdown");
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 CoordinatorActor stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Option<Addr<OrderActor>>")]
pub struct GetOrderActor;

#[derive(Message)]
#[rtype(result = "Option<Arc<CatalogCommandHandler>>")]
pub struct GetCatalogHandler;

#[derive(Message)]
#[rtype(result = "Option<Addr<DlqActor>>")]
pub struct GetDlqActor;

#[derive(Message)]
#[rtype(result = "Result<(), String>")]
pub struct Shutdown;

impl Handler<GetOrderActor> for CoordinatorActor {
    type Result = Option<Addr<OrderActor>>;

    fn handle(&mut self, _msg: GetOrderActor, _ctx: &mut Self::Context) -> Self::Result {
        self.order_actor.clone()
    }
}

impl Handler<GetCatalogHandler> for CoordinatorActor {
    type Result = Option<Arc<CatalogCommandHandler>>;

    fn handle(&mut self, _msg: GetCatalogHandler, _ctx: &mut Self::Context) -> Self::Result {
        self.catalog.clone()
    }
}

impl Handler<GetDlqActor> for CoordinatorActor {
    type Result = Option<Addr<DlqActor>>;

    fn handle(&mut self, _msg: GetDlqActor, _ctx: &mut Self::Context) -> Self::Result {
        self.dlq_actor.clone()
    }
}

impl Handler<Shutdown> for CoordinatorActor {
    type Result = Result<(), String>;

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Received shutdown signal");

        // Stop child actors gracefully
        if let Some(ref order_actor) = self.order_actor {
            order_actor.do_send(StopActor);
        }

        if let Some(ref dlq_actor) = self.dlq_actor {
            dlq_actor.do_send(StopActor);
        }

        if let Some(ref health_monitor) = self.health_monitor {
            health_monitor.kill();
        }

        // Stop coordinator
        ctx.stop();

        Ok(())
    }
}

/// Message to gracefully stop an actor
#[derive(Message)]
#[rtype(result = "()")]
struct StopActor;

impl Handler<StopActor> for OrderActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("OrderActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for DlqActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("DlqActor received stop signal");
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::order_actor::ListOrders;
    use crate::domain::order::Money;
    use crate::persistence::seed;
    use crate::persistence::testing::memory_pool;

    #[actix::test]
    async fn test_coordinator_wires_children() {
        let pool = memory_pool().await;
        seed::upsert_product(&pool, 1, "Air Runner", Money::from_cents(12000)).await.unwrap();
        seed::add_to_wishlist(&pool, "mario@example.com", 1).await.unwrap();
        let metrics = Arc::new(Metrics::new().unwrap());
        let coordinator = CoordinatorActor::new(pool, AppConfig::default(), metrics).start();

        let order_actor = coordinator.send(GetOrderActor).await.unwrap().unwrap();
        let history = order_actor
            .send(ListOrders { owner_email: "mario@example.com".to_string() })
            .await
            .unwrap()
            .unwrap();
        assert!(history.is_empty());

        let catalog = coordinator.send(GetCatalogHandler).await.unwrap().unwrap();
        assert_eq!(catalog.update_price(1, Money::from_cents(9900)).await.unwrap(), 1);

        assert!(coordinator.send(GetDlqActor).await.unwrap().is_some());
        coordinator.send(Shutdown).await.unwrap().unwrap();
    }
}
