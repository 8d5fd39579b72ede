use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write
/// locking.
///
/// The world and the game loop share a handful of small values across the
/// foreground and the worldgen thread, most notably the tracked viewer
/// position that drives chunk generation. `MtResource` wraps such a value in
/// an `Arc<RwLock<T>>` so both sides hold a cheap clone, read concurrently,
/// and take the write lock only for the rare update.
///
/// # Examples
///
/// ```
/// use voxel_world::core::MtResource;
/// use cgmath::Point3;
///
/// let position = MtResource::new(Point3::new(0.0_f32, 0.0, 64.0));
/// let for_worldgen = position.clone();
///
/// *position.get_mut() = Point3::new(32.0, 0.0, 64.0);
/// assert_eq!(for_worldgen.get().x, 32.0);
/// ```
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Wraps `resource` in a fresh shared container.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Read access. Concurrent readers do not block each other.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap()
    }

    /// Exclusive write access.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap()
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
