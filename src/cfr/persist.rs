//! Snapshots of an info set store as keyed-array text maps.
//!
//! A snapshot file holds one vector per info set:
//!
//! ```text
//! {
//!   "0:": [0.75, 0.25],
//!   "0:b": [1.0, 0.0]
//! }
//! ```
//!
//! Keys use JSON string escaping, so a newline inside a key is written as
//! `\n`. A store is saved as two snapshots (regret sums and cumulative
//! strategies) and loaded by merging them back together.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cfr::config::CfrStats;
use crate::cfr::key::InfoSetKey;
use crate::cfr::storage::{InfoSet, InfoSetStore};

/// Errors from reading or writing snapshots.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Opening or creating a snapshot file failed.
    #[error("{path}: {source}")]
    File {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output stream failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not a well-formed keyed-array map.
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The two snapshots disagree on an info set's action count.
    #[error("info set {key:?} has {regret} regrets but {strategy} strategy entries")]
    LengthMismatch {
        /// Text form of the key.
        key: String,
        /// Length in the regret snapshot.
        regret: usize,
        /// Length in the strategy snapshot.
        strategy: usize,
    },
}

/// Key -> vector map, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<String, Vec<f64>>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<K: InfoSetKey>(store: &InfoSetStore<K>, field: impl Fn(&InfoSet) -> &[f64]) -> Self {
        let entries = store
            .iter()
            .map(|(key, info_set)| (key.to_text(), field(info_set).to_vec()))
            .collect();
        Self { entries }
    }

    /// Cumulative regret of every info set.
    pub fn regret_sum<K: InfoSetKey>(store: &InfoSetStore<K>) -> Self {
        Self::collect(store, InfoSet::regret_sum)
    }

    /// Cumulative strategy of every info set.
    pub fn cumulative_strategy<K: InfoSetKey>(store: &InfoSetStore<K>) -> Self {
        Self::collect(store, InfoSet::cumulative_strategy)
    }

    /// Instantaneous regret of every info set.
    pub fn instant_regret<K: InfoSetKey>(store: &InfoSetStore<K>) -> Self {
        Self::collect(store, InfoSet::instant_regret)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Insert a vector, returning the previous one.
    pub fn insert(&mut self, key: String, values: Vec<f64>) -> Option<Vec<f64>> {
        self.entries.insert(key, values)
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<f64>)> {
        self.entries.iter()
    }

    /// Write the snapshot in keyed-array text form.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), PersistError> {
        writeln!(writer, "{{")?;
        let last = self.entries.len().saturating_sub(1);
        for (i, (key, values)) in self.entries.iter().enumerate() {
            let rendered = values
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            let separator = if i == last { "" } else { "," };
            writeln!(
                writer,
                "  {}: [{}]{}",
                serde_json::to_string(key)?,
                rendered.join(", "),
                separator
            )?;
        }
        writeln!(writer, "}}")?;
        writer.flush()?;
        Ok(())
    }

    /// Parse a snapshot. Fails on any malformed input.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, PersistError> {
        let entries: BTreeMap<String, Vec<f64>> = serde_json::from_reader(reader)?;
        Ok(Self { entries })
    }

    /// Save to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| PersistError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_to(BufWriter::new(file))?;
        log::info!("saved {} entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Load from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PersistError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::read_from(BufReader::new(file))?;
        log::info!("loaded {} entries from {}", snapshot.len(), path.display());
        Ok(snapshot)
    }
}

impl FromIterator<(String, Vec<f64>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f64>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Rebuild a store from a regret snapshot and a strategy snapshot.
///
/// A key present in only one snapshot gets a zero-filled vector for the
/// other. Regrets keep their sign (a plain-CFR snapshot may hold negative
/// ones; the CFR+ engines clip them on load) and strategies are recomputed
/// from them.
pub fn merge<K: InfoSetKey>(regret: &Snapshot, strategy: &Snapshot) -> Result<InfoSetStore<K>, PersistError> {
    let mut store = InfoSetStore::with_capacity(regret.len().max(strategy.len()));

    for (key, regret_sum) in regret.iter() {
        let cumulative = match strategy.get(key) {
            Some(values) if values.len() != regret_sum.len() => {
                return Err(PersistError::LengthMismatch {
                    key: key.clone(),
                    regret: regret_sum.len(),
                    strategy: values.len(),
                });
            }
            Some(values) => values.to_vec(),
            None => vec![0.0; regret_sum.len()],
        };
        store.insert(K::from_text(key), InfoSet::from_sums(regret_sum.clone(), cumulative));
    }

    for (key, cumulative) in strategy.iter() {
        if regret.get(key).is_none() {
            store.insert(
                K::from_text(key),
                InfoSet::from_sums(vec![0.0; cumulative.len()], cumulative.clone()),
            );
        }
    }

    Ok(store)
}

/// Save a store as two snapshot files.
pub fn save_store<K: InfoSetKey, P: AsRef<Path>>(
    store: &InfoSetStore<K>,
    regret_path: P,
    strategy_path: P,
) -> Result<(), PersistError> {
    Snapshot::regret_sum(store).save(regret_path)?;
    Snapshot::cumulative_strategy(store).save(strategy_path)
}

/// Load a store from two snapshot files.
pub fn load_store<K: InfoSetKey, P: AsRef<Path>>(regret_path: P, strategy_path: P) -> Result<InfoSetStore<K>, PersistError> {
    let regret = Snapshot::load(regret_path)?;
    let strategy = Snapshot::load(strategy_path)?;
    merge(&regret, &strategy)
}

/// Save training statistics next to a store, so a resumed run can pick up
/// the iteration count.
pub fn save_stats<P: AsRef<Path>>(stats: &CfrStats, path: P) -> Result<(), PersistError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| PersistError::File {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), stats)?;
    Ok(())
}

/// Load statistics written by [`save_stats`].
pub fn load_stats<P: AsRef<Path>>(path: P) -> Result<CfrStats, PersistError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PersistError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(snapshot: &Snapshot) -> String {
        let mut buffer = Vec::new();
        snapshot.write_to(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_write_format() {
        let snapshot: Snapshot = vec![
            ("b".to_string(), vec![0.5, 2.0]),
            ("a\nx".to_string(), vec![1.0]),
        ]
        .into_iter()
        .collect();

        assert_eq!(render(&snapshot), "{\n  \"a\\nx\": [1.0],\n  \"b\": [0.5, 2.0]\n}\n");
        assert_eq!(render(&Snapshot::new()), "{\n}\n");
    }

    #[test]
    fn test_read_back() {
        let snapshot: Snapshot = vec![
            ("x . .\n. o .\n. . .".to_string(), vec![0.1, 0.2, 1e-9]),
            ("0:pb".to_string(), vec![3.25, 0.0]),
        ]
        .into_iter()
        .collect();

        let parsed = Snapshot::read_from(render(&snapshot).as_bytes()).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_malformed_input_fails() {
        for text in ["", "{", "{\"a\": [1.0, 2.0}", "\"a\": [1.0]", "{\"a\": 1.0}"] {
            assert!(
                matches!(Snapshot::read_from(text.as_bytes()), Err(PersistError::Json(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_merge_fills_missing_side() {
        let regret: Snapshot = vec![("a".to_string(), vec![1.0, -2.0])].into_iter().collect();
        let strategy: Snapshot = vec![("b".to_string(), vec![1.0, 3.0, 0.0])].into_iter().collect();

        let store: InfoSetStore<String> = merge(&regret, &strategy).unwrap();
        assert_eq!(store.len(), 2);

        let a = store.get(&"a".to_string()).unwrap();
        assert_eq!(a.regret_sum(), &[1.0, -2.0]);
        assert_eq!(a.cumulative_strategy(), &[0.0, 0.0]);
        assert_eq!(a.current_strategy(), &[1.0, 0.0]);

        let b = store.get(&"b".to_string()).unwrap();
        assert_eq!(b.regret_sum(), &[0.0; 3]);
        assert_eq!(b.average_strategy(), vec![0.25, 0.75, 0.0]);
    }

    #[test]
    fn test_merge_rejects_length_mismatch() {
        let regret: Snapshot = vec![("a".to_string(), vec![1.0, 2.0])].into_iter().collect();
        let strategy: Snapshot = vec![("a".to_string(), vec![1.0])].into_iter().collect();
        assert!(matches!(
            merge::<String>(&regret, &strategy),
            Err(PersistError::LengthMismatch { regret: 2, strategy: 1, .. })
        ));
    }

    #[test]
    fn test_stats_file() {
        let path = std::env::temp_dir().join(format!("cfr-plus-stats-{}.json", std::process::id()));
        let stats = CfrStats {
            iterations: 1500,
            info_sets: 12,
            elapsed_seconds: 0.5,
            iterations_per_second: 3000.0,
            root_utilities: vec![-0.05, 0.05],
        };
        save_stats(&stats, &path).unwrap();
        assert_eq!(load_stats(&path).unwrap(), stats);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = Snapshot::load("/nonexistent/cfr-plus/regret.json").unwrap_err();
        assert!(matches!(err, PersistError::File { .. }));
    }
}
