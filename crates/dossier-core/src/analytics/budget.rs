use crate::error::{DossierError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Limits on a single analytics run.
///
/// Checked between Brandes source iterations and between modularity
/// merge steps. Exceeding either limit fails the whole run; partial
/// results are never returned.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsBudget {
    pub max_time: Option<Duration>,
    /// Set to true from any thread to abort the run.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl AnalyticsBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Fill in a deadline from config when the caller gave none.
    pub(crate) fn or_max_time(mut self, fallback: Option<Duration>) -> Self {
        self.max_time = self.max_time.or(fallback);
        self
    }

    pub(crate) fn start(&self) -> Deadline {
        Deadline {
            started: Instant::now(),
            max_time: self.max_time,
            cancel: self.cancel.clone(),
        }
    }
}

/// A started budget clock.
#[derive(Debug, Clone)]
pub(crate) struct Deadline {
    started: Instant,
    max_time: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Deadline {
    pub(crate) fn check(&self, completed: usize, total: usize) -> Result<()> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(DossierError::Cancelled);
        }
        if let Some(max_time) = self.max_time {
            let elapsed = self.started.elapsed();
            if elapsed >= max_time {
                return Err(DossierError::Timeout {
                    elapsed,
                    completed,
                    total,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_never_fails() {
        let deadline = AnalyticsBudget::unlimited().start();
        assert!(deadline.check(0, 10).is_ok());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let deadline = AnalyticsBudget::unlimited()
            .with_cancel_flag(Arc::clone(&flag))
            .start();
        assert!(deadline.check(0, 1).is_ok());
        flag.store(true, Ordering::Relaxed);
        assert!(matches!(deadline.check(0, 1), Err(DossierError::Cancelled)));
    }

    #[test]
    fn test_zero_deadline_times_out() {
        let deadline = AnalyticsBudget::unlimited()
            .with_max_time(Duration::ZERO)
            .start();
        assert!(matches!(
            deadline.check(3, 7),
            Err(DossierError::Timeout {
                completed: 3,
                total: 7,
                ..
            })
        ));
    }

    #[test]
    fn test_budget_overrides_config() {
        let budget = AnalyticsBudget::unlimited()
            .with_max_time(Duration::from_secs(1))
            .or_max_time(Some(Duration::from_secs(9)));
        assert_eq!(budget.max_time, Some(Duration::from_secs(1)));
        let fallback = AnalyticsBudget::unlimited().or_max_time(Some(Duration::from_secs(9)));
        assert_eq!(fallback.max_time, Some(Duration::from_secs(9)));
    }
}
