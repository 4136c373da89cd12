///! Scheduled task manager
///!
///! Periodically reloads the read-only callbook caches (IC, Nkom, DMR, VE
///! sessions) from disk so imports become visible without a restart.

use crate::store::Reloadable;
use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Configuration for scheduled tasks
#[derive(Debug, Clone)]
pub struct ScheduledTaskConfig {
    /// Interval for cache reloads (in minutes)
    pub cache_reload_interval_minutes: u64,

    /// Reload once immediately on start
    pub perform_initial_reload: bool,
}

impl Default for ScheduledTaskConfig {
    fn default() -> Self {
        Self {
            cache_reload_interval_minutes: 60,
            perform_initial_reload: false,
        }
    }
}

/// Scheduled task manager
pub struct ScheduledTaskManager {
    config: ScheduledTaskConfig,
    caches: Vec<Arc<dyn Reloadable>>,
    task_handles: Vec<JoinHandle<()>>,
}

impl ScheduledTaskManager {
    pub fn new(config: ScheduledTaskConfig, caches: Vec<Arc<dyn Reloadable>>) -> Self {
        Self {
            config,
            caches,
            task_handles: Vec::new(),
        }
    }

    /// Start all scheduled tasks
    pub fn start_all(&mut self) {
        tracing::info!("Starting scheduled task manager...");

        let reload_handle = self.start_cache_reload_task();
        self.task_handles.push(reload_handle);

        tracing::info!(
            "Started {} scheduled tasks (cache reload every {} min)",
            self.task_handles.len(),
            self.config.cache_reload_interval_minutes
        );
    }

    fn start_cache_reload_task(&self) -> JoinHandle<()> {
        let caches = self.caches.clone();
        let interval_minutes = self.config.cache_reload_interval_minutes.max(1);
        let perform_initial = self.config.perform_initial_reload;

        tracing::info!(
            "Scheduling cache reload task (interval: {} minutes, initial: {})",
            interval_minutes,
            perform_initial
        );

        tokio::spawn(async move {
            if perform_initial {
                Self::reload_all(&caches).await;
            }
            Self::cache_reload_loop(caches, interval_minutes).await;
        })
    }

    async fn cache_reload_loop(caches: Vec<Arc<dyn Reloadable>>, interval_minutes: u64) {
        loop {
            let now = Utc::now();
            let next_trigger = Self::calculate_next_reload_time(now, interval_minutes);
            let sleep_duration = (next_trigger - now)
                .to_std()
                .unwrap_or(Duration::from_secs(60));

            tracing::debug!(
                "Next cache reload at: {} (in {:.1} min)",
                next_trigger.format("%Y-%m-%d %H:%M:%S UTC"),
                sleep_duration.as_secs_f64() / 60.0
            );

            tokio::time::sleep(sleep_duration).await;
            Self::reload_all(&caches).await;
        }
    }

    /// Next wall-clock boundary of the interval, e.g. xx:00, xx:15, ... for 15.
    fn calculate_next_reload_time(now: DateTime<Utc>, interval_minutes: u64) -> DateTime<Utc> {
        let step = ChronoDuration::minutes(interval_minutes.max(1) as i64);
        match now.duration_trunc(step) {
            Ok(floor) => floor + step,
            Err(_) => now + step,
        }
    }

    async fn reload_all(caches: &[Arc<dyn Reloadable>]) {
        for cache in caches {
            match cache.reload().await {
                Ok(count) => tracing::info!("Reloaded '{}' ({} records)", cache.name(), count),
                Err(e) => tracing::error!("Reloading '{}' failed: {}", cache.name(), e),
            }
        }
    }

    /// Gracefully shutdown all tasks
    pub fn shutdown(self) {
        tracing::info!("Shutting down scheduled task manager...");

        for handle in self.task_handles {
            handle.abort();
        }

        tracing::info!("All scheduled tasks stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_calculate_next_reload_time() {
        // 10:07 with a 15 minute interval -> 10:15
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 10, 7, 30).unwrap();
        let next = ScheduledTaskManager::calculate_next_reload_time(now, 15);
        assert_eq!((next.hour(), next.minute(), next.second()), (10, 15, 0));

        // Exactly on a boundary -> the following one
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        let next = ScheduledTaskManager::calculate_next_reload_time(now, 60);
        assert_eq!((next.hour(), next.minute()), (11, 0));

        // Crosses midnight
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 23, 50, 0).unwrap();
        let next = ScheduledTaskManager::calculate_next_reload_time(now, 60);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_reload_all_picks_up_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dmr.json");
        let cache: Arc<Collection<u64>> = Arc::new(Collection::open("dmr", &path).await.unwrap());
        assert_eq!(cache.len().await, 0);

        tokio::fs::write(&path, r#"{"KF3RRY": 3142001}"#).await.unwrap();
        ScheduledTaskManager::reload_all(&[cache.clone() as Arc<dyn Reloadable>]).await;
        assert_eq!(cache.get("KF3RRY").await, Some(3142001));
    }
}
