//! Deduplication and ranking of scan results

use crate::radio::NetworkObservation;
use std::collections::HashMap;

/// Display label for networks that do not broadcast an SSID
pub const HIDDEN_LABEL: &str = "<hidden network>";

/// One network per identity, represented by its strongest access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedNetwork {
    /// Raw SSID, empty for hidden networks
    pub identity: String,
    pub best_signal_dbm: i32,
    pub representative_bssid: String,
}

impl RankedNetwork {
    pub fn is_hidden(&self) -> bool {
        self.identity.is_empty()
    }

    /// Name to show to a person
    pub fn label(&self) -> &str {
        if self.is_hidden() {
            HIDDEN_LABEL
        } else {
            &self.identity
        }
    }

    pub fn quality(&self) -> u8 {
        signal_quality(self.best_signal_dbm)
    }

    pub fn tier(&self) -> SignalTier {
        SignalTier::from_dbm(self.best_signal_dbm)
    }
}

/// Dedup key. Hidden networks only merge when they share an access point,
/// since their shared display label says nothing about identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NetworkKey {
    Named(String),
    Hidden(String),
}

impl NetworkKey {
    fn of(observation: &NetworkObservation) -> Self {
        if observation.identity.is_empty() {
            NetworkKey::Hidden(observation.bssid.clone())
        } else {
            NetworkKey::Named(observation.identity.clone())
        }
    }
}

/// Collapse observations to one entry per network, strongest first
///
/// Ties on signal keep the observation seen first, both within a network and
/// in the final ordering.
pub fn aggregate(observations: &[NetworkObservation]) -> Vec<RankedNetwork> {
    let mut ranked: Vec<RankedNetwork> = Vec::new();
    let mut index: HashMap<NetworkKey, usize> = HashMap::new();

    for obs in observations {
        match index.get(&NetworkKey::of(obs)) {
            Some(&i) => {
                let entry = &mut ranked[i];
                if obs.signal_dbm > entry.best_signal_dbm {
                    entry.best_signal_dbm = obs.signal_dbm;
                    entry.representative_bssid = obs.bssid.clone();
                }
            }
            None => {
                index.insert(NetworkKey::of(obs), ranked.len());
                ranked.push(RankedNetwork {
                    identity: obs.identity.clone(),
                    best_signal_dbm: obs.signal_dbm,
                    representative_bssid: obs.bssid.clone(),
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal strengths
    ranked.sort_by(|a, b| b.best_signal_dbm.cmp(&a.best_signal_dbm));
    ranked
}

/// Map dBm onto a 0-100 bar
pub fn signal_quality(dbm: i32) -> u8 {
    match dbm {
        d if d <= -100 => 0,
        d if d >= 0 => 100,
        d => (d + 100) as u8,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalTier {
    Strong,
    Fair,
    Weak,
}

impl SignalTier {
    pub fn from_dbm(dbm: i32) -> Self {
        if dbm > -60 {
            SignalTier::Strong
        } else if dbm > -70 {
            SignalTier::Fair
        } else {
            SignalTier::Weak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn obs(identity: &str, bssid: &str, signal: i32) -> NetworkObservation {
        NetworkObservation::new(identity, bssid, signal)
    }

    fn ranked(identity: &str, signal: i32, bssid: &str) -> RankedNetwork {
        RankedNetwork {
            identity: identity.to_string(),
            best_signal_dbm: signal,
            representative_bssid: bssid.to_string(),
        }
    }

    #[test]
    fn test_keeps_strongest_per_identity() {
        let input = [
            obs("A", "bssid1", -50),
            obs("A", "bssid2", -40),
            obs("B", "bssid3", -80),
        ];
        assert_eq!(
            aggregate(&input),
            vec![ranked("A", -40, "bssid2"), ranked("B", -80, "bssid3")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let input = [
            obs("A", "first", -55),
            obs("A", "second", -55),
            obs("C", "c1", -60),
            obs("B", "b1", -60),
        ];
        assert_eq!(
            aggregate(&input),
            vec![
                ranked("A", -55, "first"),
                ranked("C", -60, "c1"),
                ranked("B", -60, "b1"),
            ]
        );
    }

    #[test]
    fn test_hidden_networks_stay_distinct_by_bssid() {
        let input = [
            obs("", "aa:aa", -70),
            obs("", "bb:bb", -65),
            obs("", "aa:aa", -60),
        ];
        let result = aggregate(&input);
        assert_eq!(
            result,
            vec![ranked("", -60, "aa:aa"), ranked("", -65, "bb:bb")]
        );
        assert!(result.iter().all(|n| n.label() == HIDDEN_LABEL));
    }

    #[test]
    fn test_signal_quality_bounds() {
        assert_eq!(signal_quality(-120), 0);
        assert_eq!(signal_quality(-100), 0);
        assert_eq!(signal_quality(-42), 58);
        assert_eq!(signal_quality(0), 100);
        assert_eq!(signal_quality(5), 100);
    }

    #[test]
    fn test_signal_tier() {
        assert_eq!(SignalTier::from_dbm(-59), SignalTier::Strong);
        assert_eq!(SignalTier::from_dbm(-60), SignalTier::Fair);
        assert_eq!(SignalTier::from_dbm(-69), SignalTier::Fair);
        assert_eq!(SignalTier::from_dbm(-70), SignalTier::Weak);
    }

    fn observation_strategy() -> impl Strategy<Value = NetworkObservation> {
        (
            prop_oneof![Just(""), Just("A"), Just("B"), Just("C"), Just("D")],
            prop_oneof![Just("b1"), Just("b2"), Just("b3")],
            -100i32..=0,
        )
            .prop_map(|(id, bssid, signal)| obs(id, bssid, signal))
    }

    proptest! {
        #[test]
        fn prop_unique_and_sorted(input in prop::collection::vec(observation_strategy(), 0..40)) {
            let result = aggregate(&input);

            let keys: HashSet<_> = result
                .iter()
                .map(|n| (n.identity.clone(), n.is_hidden().then(|| n.representative_bssid.clone())))
                .collect();
            prop_assert_eq!(keys.len(), result.len());

            for pair in result.windows(2) {
                prop_assert!(pair[0].best_signal_dbm >= pair[1].best_signal_dbm);
            }
        }

        #[test]
        fn prop_signal_is_group_maximum(input in prop::collection::vec(observation_strategy(), 0..40)) {
            for network in aggregate(&input) {
                let max = input
                    .iter()
                    .filter(|o| o.identity == network.identity)
                    .filter(|o| !network.is_hidden() || o.bssid == network.representative_bssid)
                    .map(|o| o.signal_dbm)
                    .max();
                prop_assert_eq!(max, Some(network.best_signal_dbm));
            }
        }
    }
}
