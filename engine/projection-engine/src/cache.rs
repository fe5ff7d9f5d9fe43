//! Freshness-keyed caching of derived projections

use crate::builder::ProjectionBuilder;
use crate::error::{ProjectionError, Result};
use crate::models::{PlayerSummary, Projection};
use crate::source::RecordSource;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;

#[derive(Debug)]
struct Entry<K, T> {
    token: K,
    loaded_at: DateTime<Utc>,
    value: Arc<T>,
}

/// Single-slot cache that reloads when handed a newer freshness token
#[derive(Debug)]
pub struct FreshnessCache<K, T> {
    slot: RwLock<Option<Entry<K, T>>>,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct Refresh<T> {
    pub value: Arc<T>,
    /// Whether the loader ran for this lookup
    pub reloaded: bool,
}

impl<K, T> Default for FreshnessCache<K, T> {
    fn default() -> Self {
        Self { slot: RwLock::new(None) }
    }
}

impl<K: PartialOrd + Copy, T> FreshnessCache<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, whatever its age
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().as_ref().map(|entry| Arc::clone(&entry.value))
    }

    pub fn token(&self) -> Option<K> {
        self.slot.read().as_ref().map(|entry| entry.token)
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().as_ref().map(|entry| entry.loaded_at)
    }

    /// True when nothing is cached or `token` is newer than the cached one
    pub fn is_stale(&self, token: K) -> bool {
        match self.slot.read().as_ref() {
            Some(entry) => token > entry.token,
            None => true,
        }
    }

    /// Return the cached value, running `load` first if it is stale for `token`.
    ///
    /// A failed load leaves the previous entry in place.
    pub fn get_or_refresh<E, F>(&self, token: K, load: F) -> std::result::Result<Refresh<T>, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        if let Some(entry) = self.slot.read().as_ref() {
            if !(token > entry.token) {
                return Ok(Refresh { value: Arc::clone(&entry.value), reloaded: false });
            }
        }

        let mut slot = self.slot.write();
        // Another caller may have reloaded while we waited for the lock
        if let Some(entry) = slot.as_ref() {
            if !(token > entry.token) {
                return Ok(Refresh { value: Arc::clone(&entry.value), reloaded: false });
            }
        }

        let value = Arc::new(load()?);
        *slot = Some(Entry { token, loaded_at: Utc::now(), value: Arc::clone(&value) });
        Ok(Refresh { value, reloaded: true })
    }

    /// Drop the cached entry so the next lookup reloads
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}

/// Players and projections built from one version of the source
#[derive(Debug, Default)]
pub struct Snapshot {
    players: Vec<PlayerSummary>,
    projections: Vec<Projection>,
    by_id: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new(players: Vec<PlayerSummary>, projections: Vec<Projection>) -> Self {
        let by_id = projections
            .iter()
            .enumerate()
            .map(|(idx, projection)| (projection.id.clone(), idx))
            .collect();
        Self { players, projections, by_id }
    }

    pub fn players(&self) -> &[PlayerSummary] {
        &self.players
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn projection(&self, id: &str) -> Option<&Projection> {
        self.by_id.get(id).map(|&idx| &self.projections[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

/// Serves projections from a record source, rebuilding only when it changes
pub struct ProjectionStore<S> {
    source: S,
    builder: ProjectionBuilder,
    cache: FreshnessCache<SystemTime, Snapshot>,
}

impl<S: RecordSource> ProjectionStore<S> {
    pub fn new(source: S, builder: ProjectionBuilder) -> Self {
        Self { source, builder, cache: FreshnessCache::new() }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current snapshot, reloading first if the source changed
    pub fn ensure_fresh(&self) -> Result<Arc<Snapshot>> {
        Ok(self.refresh()?.value)
    }

    /// Check the source and reload if needed; returns whether a reload happened
    pub fn reload(&self) -> Result<bool> {
        Ok(self.refresh()?.reloaded)
    }

    /// When the cached snapshot was built
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.cache.loaded_at()
    }

    /// Look up one player's projection
    pub fn projection(&self, id: &str) -> Result<Projection> {
        let snapshot = self.ensure_fresh()?;
        snapshot
            .projection(id)
            .cloned()
            .ok_or_else(|| ProjectionError::not_found(format!("projection for '{id}'")))
    }

    fn refresh(&self) -> Result<Refresh<Snapshot>> {
        let token = self.source.freshness()?;
        let refresh = self.cache.get_or_refresh(token, || self.build_snapshot())?;

        if refresh.reloaded {
            info!(
                "Reloaded {} @ {} (rows: players={} projections={})",
                self.source.describe(),
                Utc::now().format("%H:%M:%S"),
                refresh.value.players().len(),
                refresh.value.projections().len()
            );
        }

        Ok(refresh)
    }

    fn build_snapshot(&self) -> Result<Snapshot> {
        let records = self.source.load()?;
        let players = records.iter().map(PlayerSummary::from).collect();
        let projections = self.builder.build_all(&records);
        Ok(Snapshot::new(players, projections))
    }
}
