//! Object container and id allocation

use std::collections::HashMap;

use slotmap::{DefaultKey, SlotMap};
use thiserror::Error;

use super::{GameObject, GameObjectId};

/// Monotonic id generator owned by a [`World`]
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    /// Sequence starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id
    pub fn next_id(&mut self) -> GameObjectId {
        let id = GameObjectId(self.next);
        self.next += 1;
        id
    }

    /// Id the next call to [`IdSequence::next_id`] returns
    pub fn peek(&self) -> GameObjectId {
        GameObjectId(self.next)
    }
}

/// Rejected [`World::insert`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// An object with this id is already stored
    #[error("Game object {0} is already in the world")]
    DuplicateId(GameObjectId),

    /// The id was never handed out by this world's sequence
    #[error("Game object {0} was not issued by this world")]
    UnknownId(GameObjectId),
}

/// Owns the game objects of a scene
///
/// Objects live in a slot map; `keys` maps each id to its slot, so every id
/// names at most one stored object.
#[derive(Debug, Default)]
pub struct World {
    ids: IdSequence,
    objects: SlotMap<DefaultKey, GameObject>,
    keys: HashMap<GameObjectId, DefaultKey>,
}

impl World {
    /// Empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object with a fresh id without adding it to the world
    ///
    /// Useful for helpers such as a camera viewer that should not be drawn.
    pub fn create_object(&mut self) -> GameObject {
        GameObject::new(self.ids.next_id())
    }

    /// Create an object with a fresh id, add it and return it for setup
    pub fn spawn(&mut self) -> &mut GameObject {
        let object = self.create_object();
        self.store(object)
    }

    /// Add an object created by this world, such as one taken out with
    /// [`World::remove`] or made by [`World::create_object`]
    pub fn insert(&mut self, object: GameObject) -> Result<&mut GameObject, SceneError> {
        let id = object.id();
        if id >= self.ids.peek() {
            return Err(SceneError::UnknownId(id));
        }
        if self.keys.contains_key(&id) {
            return Err(SceneError::DuplicateId(id));
        }
        Ok(self.store(object))
    }

    fn store(&mut self, object: GameObject) -> &mut GameObject {
        log::trace!("Adding game object {}", object.id());
        let id = object.id();
        let key = self.objects.insert(object);
        self.keys.insert(id, key);
        &mut self.objects[key]
    }

    /// Remove an object by id
    pub fn remove(&mut self, id: GameObjectId) -> Option<GameObject> {
        let key = self.keys.remove(&id)?;
        self.objects.remove(key)
    }

    /// Look up an object by id
    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(*self.keys.get(&id)?)
    }

    /// Look up an object by id for modification
    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(*self.keys.get(&id)?)
    }

    /// Stored objects, in slot order
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// Stored objects, mutable
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.values_mut()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the world has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_sequence_counts_up() {
        let mut ids = IdSequence::new();

        assert_eq!(ids.next_id(), GameObjectId(0));
        assert_eq!(ids.next_id(), GameObjectId(1));
        assert_eq!(ids.next_id(), GameObjectId(2));
    }

    #[test]
    fn test_worlds_have_independent_sequences() {
        let mut a = World::new();
        let mut b = World::new();

        let first_a = a.spawn().id();
        let second_a = a.spawn().id();
        let first_b = b.spawn().id();

        assert_eq!(first_a, GameObjectId(0));
        assert_eq!(second_a, GameObjectId(1));
        assert_eq!(first_b, GameObjectId(0));
    }

    #[test]
    fn test_detached_objects_still_consume_ids() {
        let mut world = World::new();

        let viewer = world.create_object();
        let cube = world.spawn().id();

        assert_ne!(viewer.id(), cube);
        assert_eq!(world.len(), 1);
        assert!(world.get(viewer.id()).is_none());
    }

    #[test]
    fn test_spawn_get_and_remove() {
        let mut world = World::new();
        let id = {
            let object = world.spawn();
            object.transform.translation = Vec3::new(0.0, 0.0, 2.5);
            object.id()
        };

        assert_eq!(
            world.get(id).map(|o| o.transform.translation.z),
            Some(2.5)
        );

        world.get_mut(id).unwrap().color = Vec3::new(1.0, 0.0, 0.0);
        let removed = world.remove(id).unwrap();

        assert_eq!(removed.color, Vec3::new(1.0, 0.0, 0.0));
        assert!(world.is_empty());
        assert!(world.remove(id).is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut world = World::new();
        let id = world.spawn().id();

        let copy = GameObject::new(id);
        assert_eq!(world.insert(copy).err(), Some(SceneError::DuplicateId(id)));
        assert_eq!(world.len(), 1);

        assert!(world.remove(id).is_some());
        assert!(world.get(id).is_none());
        assert!(world.is_empty());
    }

    #[test]
    fn test_insert_rejects_ids_not_yet_issued() {
        let mut world = World::new();
        world.spawn();

        let stray = GameObject::new(GameObjectId(5));
        assert_eq!(
            world.insert(stray).err(),
            Some(SceneError::UnknownId(GameObjectId(5)))
        );
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_removed_object_can_be_reinserted() {
        let mut world = World::new();
        let id = world.spawn().id();
        let viewer = world.create_object();
        let viewer_id = viewer.id();

        let object = world.remove(id).unwrap();
        world.insert(object).unwrap().color = Vec3::new(0.0, 1.0, 0.0);
        world.insert(viewer).unwrap();

        assert_eq!(world.len(), 2);
        assert_eq!(world.get(id).map(|o| o.color), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert!(world.get(viewer_id).is_some());
        assert_eq!(world.objects().count(), 2);
    }
}
