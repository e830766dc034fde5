//! Connection supervisor: one timeout-bounded connect attempt at a time
//!
//! Each attempt runs in its own task and polls the link status until it sees
//! `Connected`, runs out of polls, or is superseded. Superseding is
//! cooperative: `connect` bumps a generation counter and wakes sleepers, and
//! every event an attempt emits is checked against that counter under the
//! same lock, so a cancelled attempt can never report a result.

use crate::config::EngineConfig;
use crate::error::{WifiError, WifiResult};
use crate::notify::{Event, Notifier};
use crate::radio::{LinkStatus, Radio, SharedRadio};
use secrecy::SecretString;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Externally visible supervisor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Connecting { identity: String },
    Connected { identity: String },
    Failed { identity: String },
    TimedOut { identity: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pending,
    InProgress,
    Succeeded,
    /// Rejected by the radio before any polling
    Failed,
    TimedOut,
}

/// A single connect attempt, owned by the task driving it
#[derive(Debug)]
pub struct ConnectionAttempt {
    generation: u64,
    pub target_identity: String,
    credential: Option<SecretString>,
    pub started_at: Instant,
    /// Reset when the radio accepts the request; polling stops here at the latest
    pub deadline: Instant,
    pub status: AttemptStatus,
    pub elapsed_poll_count: u32,
}

impl ConnectionAttempt {
    fn new(
        generation: u64,
        target_identity: String,
        credential: Option<SecretString>,
        timeout: Duration,
    ) -> Self {
        let started_at = Instant::now();
        Self {
            generation,
            target_identity,
            credential,
            started_at,
            deadline: started_at + timeout,
            status: AttemptStatus::Pending,
            elapsed_poll_count: 0,
        }
    }
}

/// Progress after `polls` of `max_polls`, rounded, capped at 100
pub fn progress_percent(polls: u32, max_polls: u32) -> u8 {
    let max = u64::from(max_polls.max(1));
    let polls = u64::from(polls);
    let percent = (200 * polls + max) / (2 * max);
    percent.min(100) as u8
}

#[derive(Debug)]
struct Shared {
    generation: u64,
    state: SupervisorState,
}

#[derive(Debug)]
struct Inner {
    radio: SharedRadio,
    notifier: Notifier,
    config: EngineConfig,
    shared: Mutex<Shared>,
    wake: Notify,
}

/// Drives connect attempts against the radio and reports through the notifier
#[derive(Debug, Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
}

impl ConnectionSupervisor {
    pub fn new(radio: SharedRadio, notifier: Notifier, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                radio,
                notifier,
                config,
                shared: Mutex::new(Shared {
                    generation: 0,
                    state: SupervisorState::Idle,
                }),
                wake: Notify::new(),
            }),
        }
    }

    /// Start an attempt, cancelling any attempt still in flight
    ///
    /// Returns the attempt's generation number.
    pub fn connect(&self, identity: impl Into<String>, credential: Option<SecretString>) -> u64 {
        let identity = identity.into();
        let generation = {
            let mut shared = self.inner.lock();
            if let SupervisorState::Connecting { identity: previous } = &shared.state {
                info!(previous = %previous, next = %identity, "superseding connect attempt");
            }
            shared.generation += 1;
            shared.state = SupervisorState::Connecting {
                identity: identity.clone(),
            };
            shared.generation
        };
        self.inner.wake.notify_waiters();

        let attempt = ConnectionAttempt::new(
            generation,
            identity,
            credential,
            self.inner.config.connect_timeout,
        );
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.drive(attempt));
        generation
    }

    /// Abandon the live attempt without reporting a result
    pub fn cancel(&self) {
        self.cancel_attempt();
    }

    /// Cancel any attempt and drop the current link
    ///
    /// A `connect` that lands while the radio is disconnecting keeps its state.
    pub async fn disconnect(&self) -> WifiResult<()> {
        let generation = self.cancel_attempt();
        self.inner.radio.run(|radio| radio.disconnect()).await?;

        let mut shared = self.inner.lock();
        if shared.generation == generation {
            shared.state = SupervisorState::Idle;
            info!("disconnected");
        } else {
            debug!("disconnect finished after a newer connect attempt started");
        }
        Ok(())
    }

    fn cancel_attempt(&self) -> u64 {
        let generation = {
            let mut shared = self.inner.lock();
            shared.generation += 1;
            if let SupervisorState::Connecting { identity } = &shared.state {
                info!(identity = %identity, "connect attempt cancelled");
                shared.state = SupervisorState::Idle;
            }
            shared.generation
        };
        self.inner.wake.notify_waiters();
        generation
    }

    pub fn state(&self) -> SupervisorState {
        self.inner.lock().state.clone()
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.state(), SupervisorState::Connecting { .. })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Publish only if `generation` is still the live attempt
    fn emit(&self, generation: u64, event: Event) -> bool {
        let shared = self.lock();
        if shared.generation != generation {
            return false;
        }
        self.notifier.publish(event);
        true
    }

    /// Sleep, waking early on cancellation. Returns whether the attempt is still live.
    async fn pause(&self, generation: u64, duration: Duration) -> bool {
        if !duration.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(duration) => {}
                () = self.wake.notified() => {}
            }
        }
        self.is_current(generation)
    }

    /// Run `op` on the radio unless the attempt was superseded by the time the lock is held
    async fn run_live<T, F>(self: &Arc<Self>, generation: u64, op: F) -> Option<WifiResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Radio) -> WifiResult<T> + Send + 'static,
    {
        let inner = Arc::clone(self);
        self.radio
            .run(move |radio| {
                if !inner.is_current(generation) {
                    return Ok(None);
                }
                op(radio).map(Some)
            })
            .await
            .transpose()
    }

    async fn drive(self: Arc<Self>, mut attempt: ConnectionAttempt) {
        let generation = attempt.generation;
        attempt.status = AttemptStatus::InProgress;
        info!(identity = %attempt.target_identity, generation, "connect attempt started");

        if let Err(e) = self.radio.run(|radio| radio.disconnect()).await {
            debug!(error = %e, "pre-connect disconnect failed");
        }
        if !self.pause(generation, self.config.disconnect_settle).await {
            return;
        }

        if self.config.clear_profiles_on_connect {
            if let Err(e) = self.radio.run(|radio| radio.clear_saved_profiles()).await {
                warn!(error = %e, "clearing saved profiles failed");
            }
            if !self.is_current(generation) {
                return;
            }
        }

        let identity = attempt.target_identity.clone();
        let credential = attempt.credential.clone();
        let settle = match self
            .run_live(generation, move |radio| {
                radio.install_profile(&identity, credential.as_ref())
            })
            .await
        {
            None => return,
            Some(Ok(settle)) => settle,
            Some(Err(e)) => return self.reject(attempt, e),
        };
        if !self.pause(generation, settle).await {
            return;
        }

        let identity = attempt.target_identity.clone();
        let credential = attempt.credential.take();
        match self
            .run_live(generation, move |radio| {
                radio.request_connect(&identity, credential.as_ref())
            })
            .await
        {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => return self.reject(attempt, e),
        }

        let max_polls = self.config.max_polls();
        attempt.deadline = Instant::now() + self.config.connect_timeout;

        loop {
            if !self.pause(generation, self.config.poll_interval).await {
                return;
            }

            let status = match self.radio.run(|radio| radio.status()).await {
                Ok(status) => status,
                Err(e) => {
                    debug!(error = %e, "status poll failed");
                    LinkStatus::Other
                }
            };
            attempt.elapsed_poll_count += 1;
            debug!(poll = attempt.elapsed_poll_count, ?status, "polled link status");

            if status == LinkStatus::Connected {
                attempt.status = AttemptStatus::Succeeded;
                let address = self
                    .radio
                    .run(|radio| Ok(radio.local_address()))
                    .await
                    .ok()
                    .flatten();
                self.finish(&attempt, address);
                return;
            }

            if attempt.elapsed_poll_count >= max_polls || Instant::now() >= attempt.deadline {
                attempt.status = AttemptStatus::TimedOut;
                self.finish(&attempt, None);
                return;
            }

            let percent = progress_percent(attempt.elapsed_poll_count, max_polls);
            if !self.emit(generation, Event::ConnectProgress { percent }) {
                return;
            }
        }
    }

    fn reject(&self, mut attempt: ConnectionAttempt, error: WifiError) {
        warn!(identity = %attempt.target_identity, error = %error, "connect request rejected");
        attempt.status = AttemptStatus::Failed;
        self.finish(&attempt, None);
    }

    /// Emit the closing progress tick and the result, then settle the state
    fn finish(&self, attempt: &ConnectionAttempt, address: Option<IpAddr>) {
        let identity = attempt.target_identity.clone();
        let (success, percent, state) = match attempt.status {
            AttemptStatus::Succeeded => (true, 100, SupervisorState::Connected { identity }),
            AttemptStatus::TimedOut => (
                false,
                progress_percent(attempt.elapsed_poll_count, self.config.max_polls()),
                SupervisorState::TimedOut { identity },
            ),
            _ => (false, 0, SupervisorState::Failed { identity }),
        };

        let mut shared = self.lock();
        if shared.generation != attempt.generation {
            return;
        }
        shared.state = state;
        self.notifier.connect_progress(percent);
        self.notifier
            .connect_result(success, &attempt.target_identity, address);
        drop(shared);

        info!(
            identity = %attempt.target_identity,
            status = ?attempt.status,
            polls = attempt.elapsed_poll_count,
            elapsed_ms = attempt.started_at.elapsed().as_millis() as u64,
            "connect attempt finished"
        );
    }
}
