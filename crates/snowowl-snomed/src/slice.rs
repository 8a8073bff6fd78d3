//! Effective time slices.
//!
//! An RF2 archive is partitioned by effective time. Rows of one slice are
//! buffered in memory and spilled to a temporary SQLite database in batches;
//! only the container and dependency maps stay in memory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use rusqlite::{params, Connection, OptionalExtension};
use snowowl_types::{ReleaseType, Rf2Component, SctId, ROOT_CONTAINER};
use tempfile::TempDir;

use crate::parser::referenced_components;
use crate::planner;
use crate::types::{Rf2Error, Rf2Result};

/// Identifies one slice. Slices are imported in the order of their keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SliceKey {
    /// Rows published at the given `yyyyMMdd` effective time.
    Published(u32),
    /// Every row of a snapshot release.
    Snapshot,
    /// Rows without an effective time.
    Unpublished,
}

impl SliceKey {
    /// The slice a row belongs to.
    pub fn for_row(release_type: ReleaseType, effective_time: Option<u32>) -> Self {
        match (release_type, effective_time) {
            (ReleaseType::Snapshot, _) => Self::Snapshot,
            (_, Some(effective_time)) => Self::Published(effective_time),
            (_, None) => Self::Unpublished,
        }
    }

    /// Effective time of a published slice.
    pub fn effective_time(self) -> Option<u32> {
        match self {
            Self::Published(effective_time) => Some(effective_time),
            _ => None,
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published(effective_time) => write!(f, "{}", effective_time),
            Self::Snapshot => f.write_str("SNAPSHOT"),
            Self::Unpublished => f.write_str("UNPUBLISHED"),
        }
    }
}

/// Temporary on-disk storage of slice rows.
///
/// The database lives in a temporary directory removed when the store is
/// dropped.
pub struct SliceStore {
    conn: Connection,
    _dir: TempDir,
}

impl SliceStore {
    /// Creates an empty store sized for `release_type`.
    pub fn open_temporary(release_type: ReleaseType) -> Rf2Result<Self> {
        let dir = tempfile::tempdir()?;
        let conn = Connection::open(dir.path().join("slices.db"))?;
        // Full and snapshot releases get a larger page cache, in KiB.
        let cache_kib = match release_type {
            ReleaseType::Delta => 16_000,
            ReleaseType::Full | ReleaseType::Snapshot => 128_000,
        };
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = OFF;
             PRAGMA synchronous = OFF;
             PRAGMA cache_size = -{};
             CREATE TABLE components (
                 slice TEXT NOT NULL,
                 id TEXT NOT NULL,
                 payload TEXT NOT NULL,
                 PRIMARY KEY (slice, id)
             );",
            cache_kib
        ))?;
        Ok(Self { conn, _dir: dir })
    }

    fn put_all(&mut self, slice: SliceKey, rows: impl IntoIterator<Item = (String, String)>) -> Rf2Result<usize> {
        let slice = slice.to_string();
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO components (slice, id, payload) VALUES (?1, ?2, ?3)",
            )?;
            for (id, payload) in rows {
                stmt.execute(params![slice, id, payload])?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Reads one row of a slice.
    pub fn get(&self, slice: SliceKey, id: &str) -> Rf2Result<Option<Rf2Component>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM components WHERE slice = ?1 AND id = ?2",
                params![slice.to_string(), id],
                |row| row.get(0),
            )
            .optional()?;
        payload
            .map(|payload| serde_json::from_str(&payload).map_err(Rf2Error::from))
            .transpose()
    }

    /// Number of rows stored for a slice.
    pub fn count(&self, slice: SliceKey) -> Rf2Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM components WHERE slice = ?1",
            params![slice.to_string()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Drops every row of a slice.
    pub fn remove(&self, slice: SliceKey) -> Rf2Result<()> {
        self.conn.execute(
            "DELETE FROM components WHERE slice = ?1",
            params![slice.to_string()],
        )?;
        Ok(())
    }
}

/// The rows of one effective time.
#[derive(Debug)]
pub struct EffectiveTimeSlice {
    key: SliceKey,
    flush_threshold: usize,
    pending: HashMap<String, String>,
    members_by_container: HashMap<SctId, BTreeSet<String>>,
    dependencies: BTreeMap<SctId, BTreeSet<SctId>>,
    size: usize,
}

impl EffectiveTimeSlice {
    /// Creates an empty slice.
    pub fn new(key: SliceKey, flush_threshold: usize) -> Self {
        Self {
            key,
            flush_threshold: flush_threshold.max(1),
            pending: HashMap::new(),
            members_by_container: HashMap::new(),
            dependencies: BTreeMap::new(),
            size: 0,
        }
    }

    /// Key of the slice.
    pub fn key(&self) -> SliceKey {
        self.key
    }

    /// Number of rows registered.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no row was registered.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Adds a row.
    ///
    /// Members are remembered under their container and imported together
    /// with it. Other components become a dependency of their container so
    /// that a concept and its parts form one strongly connected group.
    pub fn register(
        &mut self,
        store: &mut SliceStore,
        container: &str,
        component: &Rf2Component,
    ) -> Rf2Result<()> {
        let id = component.id();
        if let Rf2Component::Member(_) = component {
            self.members_by_container
                .entry(parse_id(container)?)
                .or_default()
                .insert(id.clone());
        } else if container != ROOT_CONTAINER {
            let component_id = parse_id(&id)?;
            self.register_dependencies(parse_id(container)?, [component_id]);
        }

        let payload = serde_json::to_string(component)?;
        if self.pending.insert(id, payload).is_none() {
            self.size += 1;
        }
        if self.pending.len() >= self.flush_threshold {
            self.flush(store)?;
        }
        Ok(())
    }

    /// Records that `component` depends on `dependencies`.
    pub fn register_dependencies(
        &mut self,
        component: SctId,
        dependencies: impl IntoIterator<Item = SctId>,
    ) {
        self.dependencies
            .entry(component)
            .or_default()
            .extend(dependencies);
    }

    /// Writes the buffered rows to the store.
    pub fn flush(&mut self, store: &mut SliceStore) -> Rf2Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let written = store.put_all(self.key, self.pending.drain())?;
        tracing::debug!(slice = %self.key, rows = written, "Flushed slice batch");
        Ok(())
    }

    /// The dependency graph of the slice.
    pub fn dependencies(&self) -> &BTreeMap<SctId, BTreeSet<SctId>> {
        &self.dependencies
    }

    /// Batches of component ids in import order.
    pub fn import_plan(&self, batch_size: usize) -> Vec<Vec<SctId>> {
        planner::import_plan(&self.dependencies, batch_size)
    }

    /// Reads a row of this slice. Ids not registered here return `None`.
    pub fn component(&self, store: &SliceStore, id: &str) -> Rf2Result<Option<Rf2Component>> {
        match self.pending.get(id) {
            Some(payload) => Ok(Some(serde_json::from_str(payload)?)),
            None => store.get(self.key, id),
        }
    }

    /// Removes and returns the members registered under `container`.
    pub fn take_members(&mut self, container: SctId) -> BTreeSet<String> {
        self.members_by_container
            .remove(&container)
            .unwrap_or_default()
    }
}

fn parse_id(value: &str) -> Rf2Result<SctId> {
    value
        .parse()
        .map_err(|_| Rf2Error::InvalidValue(format!("'{}' is not a component id", value)))
}

/// The slices of one archive together with their store.
pub struct EffectiveTimeSlices {
    release_type: ReleaseType,
    flush_threshold: usize,
    store: SliceStore,
    slices: BTreeMap<SliceKey, EffectiveTimeSlice>,
}

impl EffectiveTimeSlices {
    /// Creates an empty set of slices backed by a fresh temporary store.
    pub fn new(release_type: ReleaseType, flush_threshold: usize) -> Rf2Result<Self> {
        Ok(Self {
            release_type,
            flush_threshold,
            store: SliceStore::open_temporary(release_type)?,
            slices: BTreeMap::new(),
        })
    }

    /// Files a row into its slice together with its dependencies.
    pub fn register(&mut self, component: &Rf2Component) -> Rf2Result<()> {
        let key = SliceKey::for_row(self.release_type, component.effective_time());
        let flush_threshold = self.flush_threshold;
        let slice = self
            .slices
            .entry(key)
            .or_insert_with(|| EffectiveTimeSlice::new(key, flush_threshold));

        let (container, node) = match component {
            Rf2Component::Member(member) => (
                member.referenced_component_id.to_string(),
                member.referenced_component_id,
            ),
            Rf2Component::Concept(concept) => (ROOT_CONTAINER.to_string(), concept.id),
            _ => {
                let container = component.container_id().unwrap_or_default();
                (container.to_string(), parse_id(&component.id())?)
            }
        };
        slice.register(&mut self.store, &container, component)?;
        slice.register_dependencies(node, referenced_components(component));
        Ok(())
    }

    /// Flushes every slice.
    pub fn flush(&mut self) -> Rf2Result<()> {
        for slice in self.slices.values_mut() {
            slice.flush(&mut self.store)?;
        }
        Ok(())
    }

    /// Slice keys in import order.
    pub fn keys(&self) -> Vec<SliceKey> {
        self.slices.keys().copied().collect()
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Returns true if no row was registered.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Removes a slice for import; its rows stay readable through [`store`](Self::store).
    pub fn take(&mut self, key: SliceKey) -> Option<EffectiveTimeSlice> {
        self.slices.remove(&key)
    }

    /// The backing store.
    pub fn store(&self) -> &SliceStore {
        &self.store
    }
}
