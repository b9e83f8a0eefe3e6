//! Background task paying territory income.

use crate::core::territory;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;

/// Spawns the loop that pays territory income every [`territory::INCOME_INTERVAL`].
///
/// Failures are logged and the loop keeps going.
pub fn spawn_income_task(db: DatabaseConnection) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(territory::INCOME_INTERVAL);
        // The first tick completes immediately; income starts after one full interval.
        interval.tick().await;
        loop {
            interval.tick().await;
            match territory::pay_income(&db).await {
                Ok(0) => tracing::debug!("No territories held, no income paid"),
                Ok(paid) => tracing::info!("Paid {paid} points of territory income"),
                Err(e) => tracing::error!("Territory income payout failed: {e}"),
            }
        }
    })
}
