use kameo::Actor;
use kameo::message::{Context, Message};
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;
use chrono::Utc;
use crate::actors::core::{HealthStatus, ComponentHealth};
use crate::persistence;

// ============================================================================
// Health Monitor Actor - Monitors system health
// ============================================================================
//
// Responsibilities:
// - Track health status of all components
// - Ping the database on a fixed interval
// - Aggregate system-wide health
//
// ============================================================================

pub const DATABASE_COMPONENT: &str = "database";

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug)]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct GetSystemHealth;

#[derive(Debug, Clone, kameo::Reply)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: chrono::DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    pool: Option<SqlitePool>,
    check_interval: Duration,
}

impl HealthMonitorActor {
    pub fn new(pool: SqlitePool, check_interval: Duration) -> Self {
        Self {
            components: HashMap::new(),
            pool: Some(pool),
            check_interval,
        }
    }

    /// Monitor that only aggregates reported health.
    #[cfg(test)]
    pub fn passive() -> Self {
        Self {
            components: HashMap::new(),
            pool: None,
            check_interval: Duration::from_secs(10),
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy_components.is_empty() {
            unhealthy_components.sort();
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Actor for HealthMonitorActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(
        state: Self::Args,
        actor_ref: ActorRef<Self>
    ) -> Result<Self, Self::Error> {
        tracing::info!("HealthMonitorActor started");

        let Some(pool) = state.pool.clone() else {
            return Ok(state);
        };
        let check_interval = state.check_interval;

        // Ping the database until the actor goes away
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(check_interval);
            loop {
                interval.tick().await;

                let status = match persistence::ping(&pool).await {
                    Ok(()) => HealthStatus::Healthy,
                    Err(sqlx::Error::PoolTimedOut) => {
                        HealthStatus::Degraded("Connection pool exhausted".to_string())
                    }
                    Err(e) => HealthStatus::Unhealthy(e.to_string()),
                };

                let update = UpdateHealth {
                    component: DATABASE_COMPONENT.to_string(),
                    status,
                    details: Some(format!("pool size {}", pool.size())),
                };
                if actor_ref.tell(update).await.is_err() {
                    tracing::debug!("Health monitor gone, stopping database checks");
                    break;
                }
            }
        });

        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<UpdateHealth> for HealthMonitorActor {
    type Reply = ();

    async fn handle(&mut self, msg: UpdateHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if !msg.status.is_healthy() {
            tracing::warn!(component = %msg.component, status = ?msg.status, "Component not healthy");
        } else {
            tracing::debug!(component = %msg.component, "Updated component health");
        }

        let health = ComponentHealth::new(msg.component.clone(), msg.status).with_details(msg.details);
        self.components.insert(msg.component, health);
    }
}

impl Message<GetSystemHealth> for HealthMonitorActor {
    type Reply = SystemHealth;

    async fn handle(&mut self, _msg: GetSystemHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let overall_status = self.compute_overall_status();

        SystemHealth {
            overall_status,
            components: self.components.clone(),
            check_time: Utc::now(),
        }
    }
}
