//! # Block Registry
//!
//! A name-keyed factory table mapping block-kind handles to constructors.
//! The registry is plain data owned by whoever builds the world: it is
//! dependency-injected into [`World::new`](crate::voxels::world::World::new)
//! rather than living in a global, so tests can assemble a minimal registry
//! without booting anything else.

use std::collections::HashMap;

use log::debug;

use crate::voxels::block::{Block, BlockHandle, BlockTexture, BasicBlock, INVALID_HANDLE};
use crate::voxels::coords::BlockCoord;

/// Name returned by [`BlockRegistry::name_of`] for an unknown handle.
pub const INVALID_BLOCK_NAME: &str = "Invalid";

/// Constructor for one block kind. Receives the global coordinate the block
/// is being created at; returns `None` when construction fails, which the
/// caller treats as "no block created".
pub type BlockFactory =
    Box<dyn Fn(BlockCoord, BlockCoord, BlockCoord) -> Option<Box<dyn Block>> + Send + Sync>;

/// Runtime-extensible table of block constructors.
#[derive(Default)]
pub struct BlockRegistry {
    by_name: HashMap<String, BlockHandle>,
    factories: Vec<BlockFactory>,
    names: Vec<String>,
}

impl BlockRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a block kind and returns its freshly assigned handle.
    ///
    /// Handles are sequential. Registering a name twice silently re-points
    /// the name at the new handle; the old handle keeps working but can no
    /// longer be found by name. Known sharp edge, kept for compatibility
    /// with runtime re-registration.
    pub fn register(&mut self, name: &str, factory: BlockFactory) -> BlockHandle {
        let handle = self.factories.len() as BlockHandle;
        self.by_name.insert(name.to_owned(), handle);
        self.factories.push(factory);
        self.names.push(name.to_owned());
        debug!("registered block kind {:?} as handle {}", name, handle);
        handle
    }

    /// Registers an ordinary solid cube kind with the given face textures.
    pub fn register_basic(&mut self, name: &str, texture: BlockTexture) -> BlockHandle {
        let handle = self.factories.len() as BlockHandle;
        self.register(
            name,
            Box::new(move |_x, _y, _z| Some(Box::new(BasicBlock::new(handle, texture)) as Box<dyn Block>)),
        )
    }

    /// Instantiates a block of the given kind at a global coordinate.
    ///
    /// An out-of-range handle, or a constructor that fails, yields `None`;
    /// nothing panics past this boundary.
    pub fn create(
        &self,
        handle: BlockHandle,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<Box<dyn Block>> {
        let factory = self.factories.get(usize::try_from(handle).ok()?)?;
        factory(x, y, z)
    }

    /// The name a handle was registered under, or [`INVALID_BLOCK_NAME`].
    pub fn name_of(&self, handle: BlockHandle) -> &str {
        usize::try_from(handle)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .unwrap_or(INVALID_BLOCK_NAME)
    }

    /// The handle currently mapped to a name, or [`INVALID_HANDLE`].
    pub fn handle_of(&self, name: &str) -> BlockHandle {
        self.by_name.get(name).copied().unwrap_or(INVALID_HANDLE)
    }

    /// Number of registered kinds (including shadowed ones).
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirt_factory() -> BlockFactory {
        Box::new(|_, _, _| Some(Box::new(BasicBlock::new(0, BlockTexture::uniform(1)))))
    }

    #[test]
    fn handles_are_sequential() {
        let mut registry = BlockRegistry::new();
        assert_eq!(registry.register("dirt", dirt_factory()), 0);
        assert_eq!(registry.register("stone", dirt_factory()), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_name_overwrites_instead_of_erroring() {
        let mut registry = BlockRegistry::new();
        let first = registry.register("dirt", dirt_factory());
        let second = registry.register("dirt", dirt_factory());

        assert_ne!(first, second);
        assert_eq!(registry.handle_of("dirt"), second);
        // The shadowed handle still resolves to a block and its name.
        assert!(registry.create(first, 0, 0, 0).is_some());
        assert_eq!(registry.name_of(first), "dirt");
    }

    #[test]
    fn invalid_lookups_return_sentinels() {
        let registry = BlockRegistry::new();
        assert!(registry.create(99_999, 0, 0, 0).is_none());
        assert!(registry.create(-1, 0, 0, 0).is_none());
        assert_eq!(registry.name_of(42), INVALID_BLOCK_NAME);
        assert_eq!(registry.name_of(-5), INVALID_BLOCK_NAME);
        assert_eq!(registry.handle_of("bedrock"), INVALID_HANDLE);
    }

    #[test]
    fn failing_constructor_yields_no_block() {
        let mut registry = BlockRegistry::new();
        let handle = registry.register("cursed", Box::new(|_, _, _| None));
        assert!(registry.create(handle, 0, 0, 0).is_none());
    }
}
