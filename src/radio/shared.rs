use crate::error::{WifiError, WifiResult};
use crate::radio::Radio;
use std::sync::{Arc, Mutex};
use tracing::error;

/// Cloneable handle that serializes every call into one radio
///
/// Calls run on tokio's blocking pool while holding the lock, so a scan and
/// a connect attempt never drive the driver at the same time.
#[derive(Clone)]
pub struct SharedRadio {
    inner: Arc<Mutex<Box<dyn Radio>>>,
}

impl std::fmt::Debug for SharedRadio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRadio").finish_non_exhaustive()
    }
}

impl SharedRadio {
    pub fn new(radio: impl Radio + 'static) -> Self {
        Self::from_boxed(Box::new(radio))
    }

    pub fn from_boxed(radio: Box<dyn Radio>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(radio)),
        }
    }

    /// Run one blocking radio operation under the lock
    ///
    /// A panicking operation fails only its own call; the next caller takes
    /// the lock over and keeps using the radio.
    pub async fn run<T, F>(&self, op: F) -> WifiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Radio) -> WifiResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut radio = inner.lock().unwrap_or_else(|poisoned| {
                error!("radio call panicked earlier; reusing the adapter");
                inner.clear_poison();
                poisoned.into_inner()
            });
            op(radio.as_mut())
        })
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "radio call did not complete");
            Err(WifiError::Internal(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::{LinkStatus, NetworkObservation};
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;

    /// Panics on the first scan trigger, then behaves
    #[derive(Default)]
    struct FlakyRadio {
        triggered: bool,
    }

    impl Radio for FlakyRadio {
        fn trigger_scan(&mut self) -> WifiResult<()> {
            if !self.triggered {
                self.triggered = true;
                panic!("driver fault");
            }
            Ok(())
        }
        fn scan_results(&mut self) -> WifiResult<Vec<NetworkObservation>> {
            Ok(vec![NetworkObservation::new("A", "a1", -40)])
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

    #[tokio::test]
    async fn test_panicked_call_does_not_wedge_radio() {
        let radio = SharedRadio::new(FlakyRadio::default());

        let first = radio.run(|r| r.trigger_scan()).await;
        assert!(matches!(first, Err(WifiError::Internal(_))));

        radio.run(|r| r.trigger_scan()).await.unwrap();
        let results = radio.run(|r| r.scan_results()).await.unwrap();
        assert_eq!(results, vec![NetworkObservation::new("A", "a1", -40)]);
    }
}
