//! Wires the scheduler and supervisor around one radio and one configuration

use crate::config::EngineConfig;
use crate::error::{EngineError, WifiResult};
use crate::notify::{EventStream, Notifier};
use crate::radio::{self, Radio, SharedRadio};
use crate::scanner::ScanScheduler;
use crate::supervisor::{ConnectionSupervisor, SupervisorState};
use secrecy::SecretString;
use tracing::info;

/// Scan/connect orchestration engine
///
/// Must be created inside a tokio runtime; scanning and connect attempts run
/// as background tasks and report through the returned [`EventStream`].
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    scheduler: ScanScheduler,
    supervisor: ConnectionSupervisor,
}

impl Engine {
    pub fn new(radio: Box<dyn Radio>, config: EngineConfig) -> (Self, EventStream) {
        let radio = SharedRadio::from_boxed(radio);
        let (notifier, events) = Notifier::channel();
        let scheduler = ScanScheduler::new(radio.clone(), notifier.clone(), &config);
        let supervisor = ConnectionSupervisor::new(radio, notifier, config.clone());
        (
            Self {
                config,
                scheduler,
                supervisor,
            },
            events,
        )
    }

    /// Build the engine on the platform radio
    pub fn open_default(config: EngineConfig) -> Result<(Self, EventStream), EngineError> {
        let radio = radio::open_default()?;
        info!("radio adapter opened");
        Ok(Self::new(radio, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn start_scanning(&mut self) {
        self.scheduler.start();
    }

    pub fn stop_scanning(&mut self) {
        self.scheduler.stop();
    }

    /// Scan now unless a cycle is already running
    pub fn refresh(&self) -> bool {
        self.scheduler.scan_now()
    }

    pub fn is_scanning(&self) -> bool {
        self.scheduler.is_scanning()
    }

    pub fn connect(&self, identity: impl Into<String>, credential: Option<SecretString>) -> u64 {
        self.supervisor.connect(identity, credential)
    }

    pub fn cancel_connect(&self) {
        self.supervisor.cancel();
    }

    pub async fn disconnect(&self) -> WifiResult<()> {
        self.supervisor.disconnect().await
    }

    pub fn connection_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Stop scanning and abandon any connect attempt
    pub fn shutdown(mut self) {
        self.scheduler.stop();
        self.supervisor.cancel();
        info!("engine shut down");
    }
}
