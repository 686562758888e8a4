/// Runtime Scheduling Layer
///
/// This module provides the live half of the system:
/// - Cron timers with uuid-tracked cancelation, rebuilt from the registry
/// - HTTP dispatch to the configured workflow engines with mock fallback

// Live cron scheduler with hot install/uninstall
pub mod scheduler;

// Engine HTTP dispatch with timeout and graceful degradation
pub mod dispatcher;

// Re-export main types
pub use dispatcher::{DispatchResult, Dispatcher};
pub use scheduler::{CronScheduler, DispatchFn, FireStats};
