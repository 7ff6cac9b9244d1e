use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Polled by long running optimizations between iterations. Once it reports
/// true the caller abandons the remaining work and keeps what is committed.
pub trait Stoppable {
    fn is_stop_requested(&self) -> bool;
}

/// Shared flag for cancelling from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    stop_requested: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }
    pub fn reset(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }
}

impl Stoppable for StopFlag {
    fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

/// Requests a stop once the deadline has passed, or earlier through the flag.
#[derive(Debug, Clone)]
pub struct TimeLimit {
    deadline: Instant,
    flag: Option<StopFlag>,
}

impl TimeLimit {
    pub fn new(limit: Duration) -> Self {
        TimeLimit {
            deadline: Instant::now() + limit,
            flag: None,
        }
    }
    pub fn with_flag(limit: Duration, flag: StopFlag) -> Self {
        TimeLimit {
            deadline: Instant::now() + limit,
            flag: Some(flag),
        }
    }
}

impl Stoppable for TimeLimit {
    fn is_stop_requested(&self) -> bool {
        Instant::now() >= self.deadline || self.flag.as_ref().is_some_and(StopFlag::is_stop_requested)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl Stoppable for NeverStop {
    fn is_stop_requested(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_shared_between_clones() {
        let flag = StopFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_stop_requested());
        handle.request_stop();
        assert!(flag.is_stop_requested());
        flag.reset();
        assert!(!handle.is_stop_requested());
    }

    #[test]
    fn expired_time_limit_stops() {
        assert!(TimeLimit::new(Duration::ZERO).is_stop_requested());
        assert!(!TimeLimit::new(Duration::from_secs(3600)).is_stop_requested());
        assert!(!NeverStop.is_stop_requested());
    }
}
