//! Background rollover loop.
//!
//! Spawns a tokio task that watches the local calendar date and fires the
//! engine's daily rollover when it changes (i.e. at midnight), plus one
//! eager pass at startup to cover a process that was down at the boundary.
//! The loop holds no state of its own beyond the last date it rolled; the
//! per-task day buckets make a redundant pass harmless.

use crate::config::RolloverConfig;
use crate::engine::ChoreEngine;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Daily trigger for the regeneration pass. It competes for the engine's
/// mutation gate like any foreground caller; there is no priority.
pub struct RolloverScheduler {
    engine: ChoreEngine,
    tick: Duration,
    eager: bool,
}

impl RolloverScheduler {
    /// Create a scheduler with the default cadence (date check once a
    /// minute, eager pass on start).
    #[must_use]
    pub fn new(engine: ChoreEngine) -> Self {
        Self::from_config(engine, &RolloverConfig::default())
    }

    #[must_use]
    pub fn from_config(engine: ChoreEngine, config: &RolloverConfig) -> Self {
        Self {
            engine,
            tick: Duration::from_secs(config.tick_secs.max(1)),
            eager: config.eager_on_start,
        }
    }

    /// Override the tick interval (tests).
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Start the background loop.
    pub fn run(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(tick_secs = self.tick.as_secs(), "rollover scheduler started");
            let mut last_rolled: Option<NaiveDate> = None;

            if self.eager {
                roll_once(&self.engine, &mut last_rolled).await;
            }

            let mut interval = tokio::time::interval(self.tick);
            loop {
                interval.tick().await;
                let today = Local::now().date_naive();
                if last_rolled != Some(today) {
                    roll_once(&self.engine, &mut last_rolled).await;
                }
            }
        })
    }
}

/// Run one rollover pass. On failure the date is not recorded, so the next
/// tick retries; the per-task day buckets keep the retry idempotent.
async fn roll_once(engine: &ChoreEngine, last_rolled: &mut Option<NaiveDate>) {
    let today = Local::now().date_naive();
    match engine.daily_rollover().await {
        Ok(report) => {
            *last_rolled = Some(today);
            info!(
                %today,
                reset = report.reset,
                carried = report.carried,
                "scheduled rollover done"
            );
        }
        Err(e) => warn!("rollover failed, retrying next tick: {e}"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::BoardConfig;
    use crate::model::{RepeatDay, TaskSpec, TaskStatus};
    use crate::persist::NullPersister;
    use std::sync::Arc;

    async fn engine_with_daily_task() -> (ChoreEngine, String) {
        let engine =
            ChoreEngine::open(BoardConfig::default(), Arc::new(NullPersister), None).unwrap();
        let child = engine.add_child("Alma").await.unwrap();
        let task = engine
            .add_task(TaskSpec {
                title: "Dishes".into(),
                repeat_days: vec![RepeatDay::Daily],
                repeat_child_id: Some(child.id.clone()),
                ..TaskSpec::default()
            })
            .await
            .unwrap();
        (engine, task.id)
    }

    #[tokio::test]
    async fn eager_start_runs_one_pass() {
        let (engine, task) = engine_with_daily_task().await;
        let handle = RolloverScheduler::new(engine.clone())
            .with_tick(Duration::from_millis(10))
            .run();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let today = Local::now().date_naive();
        assert_eq!(engine.task(&task).await.unwrap().last_rollover, Some(today));
        assert_eq!(engine.task(&task).await.unwrap().status, TaskStatus::Assigned);

        handle.abort();
    }

    #[tokio::test]
    async fn later_same_day_ticks_do_not_reroll() {
        let (engine, task) = engine_with_daily_task().await;
        let handle = RolloverScheduler::new(engine.clone())
            .with_tick(Duration::from_millis(5))
            .run();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Finish the task mid-day; further ticks must not reopen it.
        engine
            .set_task_status(&task, TaskStatus::AwaitingApproval, None, None)
            .await
            .unwrap();
        engine.approve_task(&task).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.task(&task).await.unwrap().status, TaskStatus::Approved);
        handle.abort();
    }
}
