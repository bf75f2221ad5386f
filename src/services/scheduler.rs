use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::session::SessionManager;

pub struct Scheduler {
    sessions: SessionManager,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(sessions: SessionManager, config: SchedulerConfig) -> Self {
        Self {
            sessions,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let sessions = self.sessions.clone();
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let sessions = sessions.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                let start = std::time::Instant::now();
                info!(
                    event = "job_started",
                    job_name = "expire_sessions",
                    "Starting scheduled session sweep"
                );

                match sessions.expire_sweep().await {
                    Ok(swept) => info!(
                        event = "job_finished",
                        job_name = "expire_sessions",
                        swept,
                        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Scheduled session sweep finished"
                    ),
                    Err(e) => error!(
                        event = "job_failed",
                        job_name = "expire_sessions",
                        error = %e,
                        "Scheduled session sweep failed"
                    ),
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let sweep_secs = self.config.sweep_interval_seconds.max(1);

        info!("Scheduler running: session sweep every {}s", sweep_secs);

        let mut sweep_interval = interval(Duration::from_secs(sweep_secs));

        loop {
            sweep_interval.tick().await;

            if !*self.running.read().await {
                break;
            }

            let start = std::time::Instant::now();
            info!(
                event = "job_started",
                job_name = "expire_sessions",
                "Starting scheduled session sweep"
            );

            match self.sessions.expire_sweep().await {
                Ok(swept) => info!(
                    event = "job_finished",
                    job_name = "expire_sessions",
                    swept,
                    duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Scheduled session sweep finished"
                ),
                Err(e) => error!(
                    event = "job_failed",
                    job_name = "expire_sessions",
                    error = %e,
                    "Scheduled session sweep failed"
                ),
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// One sweep on demand, outside the schedule. Returns the number of
    /// sessions deactivated.
    pub async fn run_once(&self) -> Result<u64> {
        info!("Running manual session sweep...");

        let swept = self.sessions.expire_sweep().await?;
        Ok(swept)
    }
}
