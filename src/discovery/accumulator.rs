//! Shared de-duplication state for one discovery fan-out.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Instance id → name of the profile emitted for it.
///
/// Created empty per fan-out and shared by every scope worker. The lock is
/// only held for a membership check or a check-and-insert, never across a
/// remote call.
#[derive(Debug, Default)]
pub struct DiscoveryAccumulator {
    seen: Mutex<HashMap<String, String>>,
}

impl DiscoveryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `instance_id` as emitted under `name`.
    ///
    /// Returns false when another worker got there first; the first claim
    /// keeps its name.
    pub fn claim(&self, instance_id: &str, name: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains_key(instance_id) {
            return false;
        }
        seen.insert(instance_id.to_string(), name.to_string());
        true
    }

    /// Cheap pre-check so a worker can skip the name lookup for known ids.
    /// A `false` here does not reserve anything; only `claim` does.
    pub fn contains(&self, instance_id: &str) -> bool {
        self.seen.lock().contains_key(instance_id)
    }

    pub fn name_of(&self, instance_id: &str) -> Option<String> {
        self.seen.lock().get(instance_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.seen.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_claim_wins() {
        let acc = DiscoveryAccumulator::new();
        assert!(acc.claim("i-1", "web"));
        assert!(!acc.claim("i-1", "other"));
        assert_eq!(acc.name_of("i-1").as_deref(), Some("web"));
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_contains_does_not_reserve() {
        let acc = DiscoveryAccumulator::new();
        assert!(!acc.contains("i-1"));
        assert!(acc.is_empty());
        assert!(acc.claim("i-1", "web"));
        assert!(acc.contains("i-1"));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let acc = Arc::new(DiscoveryAccumulator::new());
        let handles: Vec<_> = (0..16)
            .map(|n| {
                let acc = Arc::clone(&acc);
                std::thread::spawn(move || acc.claim("i-123", &format!("worker-{n}")))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(acc.snapshot().len(), 1);
    }
}
