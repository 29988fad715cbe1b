//! Daily reconciliation, midnight scheduling, Top-100 seeding and bulk import.

mod config;
mod import;
mod reconcile;
mod scheduler;
mod seed;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use import::{import_range, import_slugs, ImportSummary};
pub use reconcile::{ReconcileError, ReconcileReport, Reconciler};
pub use scheduler::{
    next_local_midnight, Clock, DailyJob, Scheduler, SchedulerExit, SchedulerState, SystemClock,
};
pub use seed::{seed_top100, SeedEntry, SeedSummary, Top100Seed, TOP100_TAG};

pub const CRATE_NAME: &str = "studylog-sync";
