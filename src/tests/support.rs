use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::{Retryable, Sleeper, clock::Clock};

/// Clock advanced by hand, so refill and window expiry are exact.
pub(crate) struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}

/// Sleeper that returns immediately and records every requested wait.
#[derive(Clone, Default)]
pub(crate) struct RecordingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.calls.lock().unwrap().push(duration);
        Box::pin(std::future::ready(()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestError {
    pub msg: String,
    pub retryable: bool,
}

impl TestError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            retryable: true,
        }
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            retryable: false,
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for TestError {}

impl Retryable for TestError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}
