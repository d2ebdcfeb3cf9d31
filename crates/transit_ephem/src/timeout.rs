//! Bounded-latency wrapper around another provider.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use tracing::warn;

use crate::body::Body;
use crate::error::EphemerisError;
use crate::provider::{EclipticPosition, EphemerisProvider, PositionConfig, PrecisionMode};

type Answer = Result<EclipticPosition, EphemerisError>;

struct Lookup {
    body: Body,
    jd_tt: f64,
    reply: Sender<Answer>,
}

/// Serves lookups from a fixed set of worker threads and gives up on any
/// lookup that has not been answered within `timeout`.
///
/// The request queue holds at most one pending lookup per worker, so a
/// hung provider makes later callers time out instead of piling up work.
/// A late answer is discarded. Workers exit once the provider is dropped
/// and their current lookup returns.
pub struct DeadlineProvider {
    inner: Arc<dyn EphemerisProvider>,
    timeout: Duration,
    requests: Sender<Lookup>,
    workers: usize,
}

impl DeadlineProvider {
    /// Wrap `inner` behind `workers` lookup threads (at least one).
    pub fn new(
        inner: Arc<dyn EphemerisProvider>,
        timeout: Duration,
        workers: usize,
    ) -> Result<Self, EphemerisError> {
        let workers = workers.max(1);
        let (requests, queue) = bounded::<Lookup>(workers);
        for i in 0..workers {
            let inner = Arc::clone(&inner);
            let queue = queue.clone();
            thread::Builder::new()
                .name(format!("ephemeris-lookup-{i}"))
                .spawn(move || serve(inner.as_ref(), &queue))?;
        }
        Ok(Self {
            inner,
            timeout,
            requests,
            workers,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn timed_out(&self, body: Body, jd_tt: f64) -> EphemerisError {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        warn!(%body, jd_tt, timeout_ms, "ephemeris lookup timed out");
        EphemerisError::Timeout {
            body,
            jd_tt,
            timeout_ms,
        }
    }
}

fn serve(inner: &dyn EphemerisProvider, queue: &Receiver<Lookup>) {
    for lookup in queue.iter() {
        // the caller may have given up already
        let _ = lookup.reply.send(inner.position(lookup.body, lookup.jd_tt));
    }
}

impl EphemerisProvider for DeadlineProvider {
    fn precision(&self) -> PrecisionMode {
        self.inner.precision()
    }

    fn position_config(&self) -> PositionConfig {
        self.inner.position_config()
    }

    fn coverage(&self) -> Option<(f64, f64)> {
        self.inner.coverage()
    }

    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
        let deadline = Instant::now() + self.timeout;
        let (reply, answer) = bounded(1);
        let lookup = Lookup { body, jd_tt, reply };
        match self.requests.send_timeout(lookup, self.timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => return Err(self.timed_out(body, jd_tt)),
            Err(SendTimeoutError::Disconnected(_)) => {
                return Err(EphemerisError::Io("ephemeris lookup workers have exited".into()));
            }
        }
        match answer.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out(body, jd_tt)),
            Err(RecvTimeoutError::Disconnected) => Err(EphemerisError::Io(
                "ephemeris lookup worker terminated without a result".into(),
            )),
        }
    }
}
