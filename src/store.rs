//! The active-dataset slot.
//!
//! [`DatasetStore`] holds at most one dataset at a time behind a read/write
//! lock. Readers receive an `Arc` snapshot, so a concurrent replacement never
//! exposes a half-built dataset and never invalidates a snapshot already
//! handed out. A failed load leaves the previous dataset active.

use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};

use crate::{
    dataset::{Dataset, DatasetSource, ReadOptions},
    error::LoadError,
};

pub type Snapshot = Arc<Dataset>;

#[derive(Debug)]
pub struct DatasetStore {
    default_source: DatasetSource,
    options: ReadOptions,
    active: RwLock<Option<Snapshot>>,
}

impl DatasetStore {
    /// Creates an empty store; `default_source` is read lazily on first access.
    pub fn new(default_source: DatasetSource, options: ReadOptions) -> Self {
        Self {
            default_source,
            options,
            active: RwLock::new(None),
        }
    }

    /// Creates a store that already holds `dataset`.
    pub fn with_dataset(dataset: Dataset, default_source: DatasetSource) -> Self {
        Self {
            default_source,
            options: ReadOptions::default(),
            active: RwLock::new(Some(Arc::new(dataset))),
        }
    }

    /// Reads `source` and makes it the active dataset. Returns the new snapshot.
    pub fn load(&self, source: &DatasetSource) -> Result<Snapshot, LoadError> {
        self.load_with(source, &self.options)
    }

    pub fn load_with(
        &self,
        source: &DatasetSource,
        options: &ReadOptions,
    ) -> Result<Snapshot, LoadError> {
        let dataset = Dataset::read(source, options).inspect_err(|err| {
            warn!("Keeping previous dataset; loading {} failed: {err}", source.describe());
        })?;
        Ok(self.replace(dataset))
    }

    /// Swaps in an already-built dataset.
    pub fn replace(&self, dataset: Dataset) -> Snapshot {
        let snapshot = Arc::new(dataset);
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let previous = guard.replace(Arc::clone(&snapshot));
        if let Some(previous) = previous {
            debug!("Replaced dataset of {} row(s)", previous.len());
        }
        info!("Active dataset now has {} row(s)", snapshot.len());
        snapshot
    }

    /// Current snapshot, reading the default source on first access.
    pub fn get_active(&self) -> Result<Snapshot, LoadError> {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = guard.as_ref() {
            return Ok(Arc::clone(snapshot));
        }
        debug!("Loading default dataset {}", self.default_source.describe());
        let snapshot = Arc::new(Dataset::read(&self.default_source, &self.options)?);
        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Current snapshot without triggering the default load.
    pub fn current(&self) -> Option<Snapshot> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, thread};

    fn bytes(csv: &str) -> DatasetSource {
        DatasetSource::Bytes {
            name: Some("upload.csv".to_string()),
            bytes: csv.as_bytes().to_vec(),
        }
    }

    fn missing_default() -> DatasetSource {
        DatasetSource::Path(PathBuf::from("/nonexistent/area-lens/sample.csv"))
    }

    #[test]
    fn default_is_loaded_lazily_and_cached() {
        let store = DatasetStore::new(bytes("area,price\nA,1\n"), ReadOptions::default());
        assert!(store.current().is_none());
        let first = store.get_active().unwrap();
        let second = store.get_active().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_default_surfaces_load_error() {
        let store = DatasetStore::new(missing_default(), ReadOptions::default());
        assert!(matches!(store.get_active(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let store = DatasetStore::new(missing_default(), ReadOptions::default());
        let good = store.load(&bytes("area,price\nA,1\nB,2\n")).unwrap();
        assert!(store.load(&bytes("area,price\nA,1,9\n")).is_err());
        let active = store.get_active().unwrap();
        assert!(Arc::ptr_eq(&good, &active));
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn snapshots_survive_replacement() {
        let store = DatasetStore::new(missing_default(), ReadOptions::default());
        let old = store.load(&bytes("area\nA\n")).unwrap();
        store.load(&bytes("area\nB\nC\n")).unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(store.get_active().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_loads_and_reads_see_whole_datasets() {
        let store = Arc::new(DatasetStore::new(missing_default(), ReadOptions::default()));
        store.load(&bytes("area\nA\n")).unwrap();
        let writers = (0..4).map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let body = format!("area\n{}", "X\n".repeat(i + 2));
                store.load(&bytes(&body)).unwrap();
            })
        });
        let readers = (0..4).map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let snapshot = store.get_active().unwrap();
                assert_eq!(snapshot.rows().len(), snapshot.len());
                assert!(snapshot.headers().iter().any(|h| h == "area_norm"));
            })
        });
        let handles = writers.chain(readers).collect::<Vec<_>>();
        for handle in handles {
            handle.join().expect("thread");
        }
    }
}
