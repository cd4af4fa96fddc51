//! Service catalog of baseline service durations
//!
//! Baselines start from configuration and drift toward observed service
//! durations reported when staff close out a customer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Fallback baseline for service types the catalog does not know
pub const DEFAULT_BASELINE_MINUTES: f64 = 15.0;

/// Default blend weight given to a new observation
pub const DEFAULT_BLEND_WEIGHT: f64 = 0.5;

/// Baselines shipped with the service
pub fn default_baselines() -> BTreeMap<String, f64> {
    [
        ("general", 15.0),
        ("consultation", 30.0),
        ("registration", 10.0),
        ("payment", 5.0),
        ("pharmacy", 8.0),
    ]
    .into_iter()
    .map(|(name, minutes)| (name.to_string(), minutes))
    .collect()
}

/// Mapping from service type to its expected duration in minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCatalog {
    baselines: HashMap<String, f64>,
    default_baseline: f64,
    blend_weight: f64,
}

impl ServiceCatalog {
    pub fn new(baselines: BTreeMap<String, f64>, default_baseline: f64, blend_weight: f64) -> Self {
        Self {
            baselines: baselines.into_iter().collect(),
            default_baseline,
            blend_weight,
        }
    }

    /// Stored baseline, or the default when the service type is unknown
    pub fn get_baseline(&self, service_type: &str) -> f64 {
        self.baselines
            .get(service_type)
            .copied()
            .unwrap_or(self.default_baseline)
    }

    /// Blend an observed duration into a known service type's baseline.
    ///
    /// Observations for unknown service types are dropped rather than
    /// inserted. Returns the new baseline when one was updated.
    pub fn update_baseline(&mut self, service_type: &str, observed_minutes: f64) -> Option<f64> {
        let weight = self.blend_weight;
        match self.baselines.get_mut(service_type) {
            Some(baseline) => {
                let previous = *baseline;
                *baseline = previous * (1.0 - weight) + observed_minutes * weight;
                debug!(
                    "Baseline for '{}' moved {:.2} -> {:.2} (observed {:.2})",
                    service_type, previous, *baseline, observed_minutes
                );
                Some(*baseline)
            }
            None => {
                warn!(
                    "Discarding observed duration {:.2} for unknown service type '{}'",
                    observed_minutes, service_type
                );
                None
            }
        }
    }

    pub fn contains(&self, service_type: &str) -> bool {
        self.baselines.contains_key(service_type)
    }

    pub fn default_baseline(&self) -> f64 {
        self.default_baseline
    }

    /// Ordered copy of all baselines
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.baselines
            .iter()
            .map(|(name, minutes)| (name.clone(), *minutes))
            .collect()
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::new(
            default_baselines(),
            DEFAULT_BASELINE_MINUTES,
            DEFAULT_BLEND_WEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_baselines() {
        let catalog = ServiceCatalog::default();
        assert_eq!(catalog.get_baseline("general"), 15.0);
        assert_eq!(catalog.get_baseline("consultation"), 30.0);
        assert_eq!(catalog.get_baseline("tax-advice"), DEFAULT_BASELINE_MINUTES);
    }

    #[test]
    fn test_update_blends_half_and_half() {
        let mut catalog = ServiceCatalog::default();

        let updated = catalog.update_baseline("general", 25.0);
        assert_eq!(updated, Some(20.0));
        assert_eq!(catalog.get_baseline("general"), 20.0);

        catalog.update_baseline("general", 10.0);
        assert_eq!(catalog.get_baseline("general"), 15.0);
    }

    #[test]
    fn test_unknown_service_observation_is_discarded() {
        let mut catalog = ServiceCatalog::default();

        assert_eq!(catalog.update_baseline("tax-advice", 40.0), None);
        assert!(!catalog.contains("tax-advice"));
        assert_eq!(catalog.get_baseline("tax-advice"), DEFAULT_BASELINE_MINUTES);
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let catalog = ServiceCatalog::default();
        let names: Vec<_> = catalog.snapshot().into_keys().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
