//! Atomically swappable schema publication.
//!
//! A [`SchemaHandle`] owns the currently published [`SchemaVersion`]. Readers
//! clone an `Arc` and keep using that version for the whole request, while a
//! schema change builds a complete new version off to the side and swaps the
//! pointer. Nothing mutates a published version in place.

use std::sync::{Arc, RwLock};

use super::glossary::BusinessGlossary;
use super::index::SchemaIndex;
use super::snapshot::SchemaSnapshot;
use super::SchemaError;
use crate::fingerprint::compute_hash;
use crate::joins::JoinGraph;

/// One immutable schema version: the index, its join graph and a fingerprint.
#[derive(Debug)]
pub struct SchemaVersion {
    pub index: SchemaIndex,
    pub join_graph: JoinGraph,
    pub fingerprint: String,
}

impl SchemaVersion {
    /// Index a snapshot and build its join graph.
    pub fn build(snapshot: &SchemaSnapshot, glossary: BusinessGlossary) -> Result<Self, SchemaError> {
        let fingerprint = compute_hash(snapshot)?;
        let index = SchemaIndex::build(snapshot, glossary)?;
        let join_graph = JoinGraph::from_index(&index);
        Ok(Self {
            index,
            join_graph,
            fingerprint,
        })
    }
}

/// Shared pointer to the current schema version.
#[derive(Debug, Clone)]
pub struct SchemaHandle {
    current: Arc<RwLock<Arc<SchemaVersion>>>,
}

impl SchemaHandle {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(version))),
        }
    }

    /// Build and publish a version from a snapshot.
    pub fn from_snapshot(
        snapshot: &SchemaSnapshot,
        glossary: BusinessGlossary,
    ) -> Result<Self, SchemaError> {
        Ok(Self::new(SchemaVersion::build(snapshot, glossary)?))
    }

    /// The version to use for one request.
    pub fn current(&self) -> Arc<SchemaVersion> {
        // The lock only guards a pointer, so a poisoned lock still holds a valid version.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Publish a new version, returning the previous one.
    pub fn replace(&self, version: SchemaVersion) -> Arc<SchemaVersion> {
        let next = Arc::new(version);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(
            previous = %guard.fingerprint,
            next = %next.fingerprint,
            "swapping schema version"
        );
        std::mem::replace(&mut *guard, next)
    }

    /// Rebuild from a snapshot and publish it.
    ///
    /// On error the current version stays published.
    pub fn reload(
        &self,
        snapshot: &SchemaSnapshot,
        glossary: BusinessGlossary,
    ) -> Result<Arc<SchemaVersion>, SchemaError> {
        let version = SchemaVersion::build(snapshot, glossary)?;
        Ok(self.replace(version))
    }
}
