//! Location uniqueness registry
//!
//! Detects when two distinct logical elements resolve to the same location
//! path - a tagging bug in the host application. The invariant is
//! asymmetric: one element may legitimately own many paths (the same
//! component rendered at different hierarchy positions), but a path is
//! owned by at most one element at a time.
//!
//! The empty path is exempt entirely: events tracked without UI context all
//! resolve to it, and any number of elements may do so.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

/// Two elements claimed the same location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCollision {
    /// The element whose claim was rejected
    pub colliding_element_id: String,

    /// The element already owning the path
    pub existing_element_id: String,

    /// The contested path
    pub location_path: String,
}

/// Bidirectional element-to-path mapping with collision detection.
///
/// Plain owned state with an explicit lifecycle; wrap in
/// `SharedLocationRegistry` for the usual application-wide instance.
#[derive(Debug, Default)]
pub struct LocationRegistry {
    paths_by_element: HashMap<String, BTreeSet<String>>,
    element_by_path: HashMap<String, String>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `location_path` for `element_id`.
    ///
    /// - empty path: succeeds without recording anything
    /// - path already owned by the same element: idempotent success
    /// - path owned by a different element: collision, claim not recorded
    pub fn add(
        &mut self,
        location_path: &str,
        element_id: &str,
    ) -> std::result::Result<(), LocationCollision> {
        if location_path.is_empty() {
            return Ok(());
        }

        match self.element_by_path.get(location_path) {
            Some(owner) if owner != element_id => Err(LocationCollision {
                colliding_element_id: element_id.to_owned(),
                existing_element_id: owner.clone(),
                location_path: location_path.to_owned(),
            }),
            Some(_) => Ok(()),
            None => {
                self.element_by_path
                    .insert(location_path.to_owned(), element_id.to_owned());
                self.paths_by_element
                    .entry(element_id.to_owned())
                    .or_default()
                    .insert(location_path.to_owned());
                Ok(())
            }
        }
    }

    /// Release every path claimed by `element_id`.
    ///
    /// Returns `false` for an empty identifier or one with no recorded
    /// claims, `true` after removing its claims.
    pub fn delete(&mut self, element_id: &str) -> bool {
        if element_id.is_empty() {
            return false;
        }

        match self.paths_by_element.remove(element_id) {
            Some(paths) => {
                for path in &paths {
                    self.element_by_path.remove(path);
                }
                true
            }
            None => false,
        }
    }

    /// Reset all state; used for test isolation and page-level resets
    pub fn clear(&mut self) {
        self.paths_by_element.clear();
        self.element_by_path.clear();
    }

    /// Number of recorded path claims
    pub fn claim_count(&self) -> usize {
        self.element_by_path.len()
    }
}

/// Cheap-to-clone handle to an application-scoped registry.
///
/// All mutation happens behind one mutex on the single logical tracking
/// thread; independent applications in the same process create independent
/// handles rather than sharing an implicit global.
#[derive(Clone, Default)]
pub struct SharedLocationRegistry {
    inner: Arc<Mutex<LocationRegistry>>,
}

impl SharedLocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a path, logging a collision finding before returning it.
    ///
    /// Collisions are diagnostic: the caller keeps tracking with the
    /// contested path.
    pub fn add(
        &self,
        location_path: &str,
        element_id: &str,
    ) -> std::result::Result<(), LocationCollision> {
        let result = self.inner.lock().add(location_path, element_id);
        if let Err(collision) = &result {
            tracing::error!(
                path = %collision.location_path,
                element = %collision.colliding_element_id,
                owner = %collision.existing_element_id,
                "location collision: two elements resolve to the same path"
            );
        }
        result
    }

    pub fn delete(&self, element_id: &str) -> bool {
        self.inner.lock().delete(element_id)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn claim_count(&self) -> usize {
        self.inner.lock().claim_count()
    }
}
