//! Model Registry
//!
//! Holds the model set currently used for inference. Readers take a cheap
//! snapshot; a retrain builds a complete new set and swaps it in as one
//! step, so no reader ever sees a mix of old and new models.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::TrainedModelSet;

pub struct ModelStore {
    current: RwLock<Arc<TrainedModelSet>>,
}

impl ModelStore {
    pub fn new(initial: TrainedModelSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The set in effect right now; unaffected by later swaps
    pub fn snapshot(&self) -> Arc<TrainedModelSet> {
        Arc::clone(&self.current.read())
    }

    /// Publish a new set and return the one it replaced
    pub fn replace(&self, models: TrainedModelSet) -> Arc<TrainedModelSet> {
        let next = Arc::new(models);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!(
            previous = previous.len(),
            current = self.snapshot().len(),
            "model set replaced"
        );
        previous
    }

    /// Number of pollutants with a model in the current set
    pub fn count(&self) -> usize {
        self.current.read().len()
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(TrainedModelSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pollutant;
    use crate::ml::models::tests::tiny_model;

    #[test]
    fn test_starts_empty() {
        let store = ModelStore::default();
        assert_eq!(store.count(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = ModelStore::new(TrainedModelSet::new(vec![tiny_model(Pollutant::Pm25)]));
        let before = store.snapshot();

        let previous = store.replace(TrainedModelSet::new(vec![
            tiny_model(Pollutant::Co2),
            tiny_model(Pollutant::O3),
        ]));

        // Old readers keep the complete old set
        assert_eq!(before.pollutants(), vec![Pollutant::Pm25]);
        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(store.snapshot().pollutants(), vec![Pollutant::Co2, Pollutant::O3]);
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let store = Arc::new(ModelStore::new(TrainedModelSet::new(vec![tiny_model(
            Pollutant::Pm25,
        )])));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = store.snapshot();
                        let pollutants = snapshot.pollutants();
                        assert!(
                            pollutants == vec![Pollutant::Pm25]
                                || pollutants == vec![Pollutant::No2, Pollutant::So2]
                        );
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            store.replace(TrainedModelSet::new(vec![
                tiny_model(Pollutant::No2),
                tiny_model(Pollutant::So2),
            ]));
            store.replace(TrainedModelSet::new(vec![tiny_model(Pollutant::Pm25)]));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
