use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::reconcile::{ReconcileError, ReconcileReport};

/// One daily pass; implemented by the reconciler and by test doubles.
#[async_trait]
pub trait DailyJob: Send + Sync {
    async fn run_daily(&self, today: NaiveDate) -> Result<ReconcileReport, ReconcileError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// First instant of the calendar day after `now`, in `now`'s zone.
///
/// When midnight is repeated the earlier instant wins; when it is skipped by
/// a DST jump the result falls forward one hour.
pub fn next_local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let midnight = now.date_naive().succ_opt()?.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + chrono::Duration::hours(1)))
                .earliest()
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    Cancelled,
}

/// Runs a pass immediately, then once after every local midnight until
/// cancelled.
pub struct Scheduler {
    job: Arc<dyn DailyJob>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(job: Arc<dyn DailyJob>) -> Self {
        Self::with_clock(job, Arc::new(SystemClock))
    }

    pub fn with_clock(job: Arc<dyn DailyJob>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self { job, clock, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<SchedulerExit> {
        tokio::spawn(self.run(cancel))
    }

    /// An in-flight pass always completes; cancellation only interrupts the
    /// sleep between passes.
    pub async fn run(self, cancel: CancellationToken) -> SchedulerExit {
        info!("daily scheduler started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.run_once().await;

            let delay = self.delay_until_next_pass();
            info!(seconds = delay.as_secs(), "next daily pass scheduled");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!("daily scheduler stopped");
        SchedulerExit::Cancelled
    }

    async fn run_once(&self) {
        let today = self.clock.now().date_naive();
        self.state.send_replace(SchedulerState::Running);
        match self.job.run_daily(today).await {
            Ok(report) => info!(
                run_id = %report.run_id,
                problem_id = report.problem_id,
                title = %report.title,
                created = report.created,
                history_recorded = report.history_recorded,
                "daily pass finished"
            ),
            Err(err @ ReconcileError::FetchFailed(_)) => {
                warn!(%today, error = %err, "daily pass skipped")
            }
            Err(err) => error!(%today, error = %err, "daily pass failed"),
        }
        self.state.send_replace(SchedulerState::Idle);
    }

    fn delay_until_next_pass(&self) -> Duration {
        let now = self.clock.now();
        let next = next_local_midnight(&now).unwrap_or_else(|| now + chrono::Duration::days(1));
        (next - now).to_std().unwrap_or(Duration::from_secs(60))
    }
}
