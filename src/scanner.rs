//! Periodic scan cycles with an overlap guard

use crate::config::EngineConfig;
use crate::network::{RankedNetwork, aggregate};
use crate::notify::Notifier;
use crate::radio::SharedRadio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Runs one scan-and-publish pass at a time
#[derive(Debug, Clone)]
struct ScanWorker {
    radio: SharedRadio,
    notifier: Notifier,
    settle: Duration,
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when a cycle ends, however it ends
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ScanWorker {
    /// Start a cycle unless one is already running
    fn try_start(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("scan still running, tick skipped");
            return false;
        }

        let worker = self.clone();
        let guard = BusyGuard(Arc::clone(&self.busy));
        tokio::spawn(async move {
            let _guard = guard;
            let networks = worker.run_cycle().await;
            debug!(count = networks.len(), "scan cycle complete");
            worker.notifier.scan_result(networks);
        });
        true
    }

    async fn run_cycle(&self) -> Vec<RankedNetwork> {
        if let Err(e) = self.radio.run(|radio| radio.trigger_scan()).await {
            warn!(error = %e, "scan trigger failed");
            return Vec::new();
        }

        // Give the driver time to finish the sweep
        tokio::time::sleep(self.settle).await;

        match self.radio.run(|radio| radio.scan_results()).await {
            Ok(observations) => aggregate(&observations),
            Err(e) => {
                warn!(error = %e, "reading scan results failed");
                Vec::new()
            }
        }
    }
}

/// Fires a scan cycle every `scan_interval`
#[derive(Debug)]
pub struct ScanScheduler {
    worker: ScanWorker,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl ScanScheduler {
    pub fn new(radio: SharedRadio, notifier: Notifier, config: &EngineConfig) -> Self {
        Self {
            worker: ScanWorker {
                radio,
                notifier,
                settle: config.scan_settle,
                busy: Arc::new(AtomicBool::new(false)),
            },
            interval: config.scan_interval,
            task: None,
        }
    }

    /// Begin periodic scanning; the first cycle starts immediately
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        info!(interval_ms = self.interval.as_millis() as u64, "scan scheduler started");
        let worker = self.worker.clone();
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                worker.try_start();
            }
        }));
    }

    /// Run one cycle now (manual refresh). Returns false if a cycle is already running.
    pub fn scan_now(&self) -> bool {
        self.worker.try_start()
    }

    pub fn is_scanning(&self) -> bool {
        self.worker.busy.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("scan scheduler stopped");
        }
    }
}

impl Drop for ScanScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{WifiError, WifiResult};
    use crate::notify::{Event, EventStream};
    use crate::radio::{LinkStatus, NetworkObservation, Radio};
    use secrecy::SecretString;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScanOnlyRadio {
        results: Vec<NetworkObservation>,
        fail_trigger: bool,
        triggers: Arc<Mutex<u32>>,
    }

    impl Radio for ScanOnlyRadio {
        fn trigger_scan(&mut self) -> WifiResult<()> {
            *self.triggers.lock().unwrap() += 1;
            if self.fail_trigger {
                Err(WifiError::ScanFailed { code: 5 })
            } else {
                Ok(())
            }
        }
        fn scan_results(&mut self) -> WifiResult<Vec<NetworkObservation>> {
            Ok(self.results.clone())
        }
        fn request_connect(&mut self, _: &str, _: Option<&SecretString>) -> WifiResult<()> {
            Ok(())
        }
        fn disconnect(&mut self) -> WifiResult<()> {
            Ok(())
        }
        fn status(&mut self) -> WifiResult<LinkStatus> {
            Ok(LinkStatus::Disconnected)
        }
        fn clear_saved_profiles(&mut self) -> WifiResult<()> {
            Ok(())
        }
    }

    fn scheduler(radio: ScanOnlyRadio) -> (ScanScheduler, EventStream) {
        let (notifier, stream) = Notifier::channel();
        let config = EngineConfig::with_timeout(Duration::from_secs(5));
        (
            ScanScheduler::new(SharedRadio::new(radio), notifier, &config),
            stream,
        )
    }

    fn drain(stream: &mut EventStream) -> Vec<Event> {
        std::iter::from_fn(|| stream.try_recv()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_trigger_is_skipped() {
        let triggers = Arc::new(Mutex::new(0));
        let radio = ScanOnlyRadio {
            results: vec![NetworkObservation::new("A", "b1", -40)],
            triggers: Arc::clone(&triggers),
            ..Default::default()
        };
        let (scheduler, mut stream) = scheduler(radio);

        assert!(scheduler.scan_now());
        assert!(!scheduler.scan_now());

        tokio::time::sleep(Duration::from_millis(2500)).await;

        let events = drain(&mut stream);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::ScanResult(list) if list.len() == 1));
        assert_eq!(*triggers.lock().unwrap(), 1);
        assert!(!scheduler.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trigger_publishes_empty_list_and_keeps_ticking() {
        let triggers = Arc::new(Mutex::new(0));
        let radio = ScanOnlyRadio {
            fail_trigger: true,
            triggers: Arc::clone(&triggers),
            ..Default::default()
        };
        let (mut scheduler, mut stream) = scheduler(radio);
        scheduler.start();

        // Ticks at 0, 3 and 6 seconds
        tokio::time::sleep(Duration::from_millis(6500)).await;

        let events = drain(&mut stream);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| *e == Event::ScanResult(Vec::new())));
        assert_eq!(*triggers.lock().unwrap(), 3);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_periodic_scans() {
        let (mut scheduler, mut stream) = scheduler(ScanOnlyRadio::default());
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(drain(&mut stream).len(), 1);
    }
}
