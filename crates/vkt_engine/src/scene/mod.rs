//! Scene objects
//!
//! Game objects carry a transform, an optional shared model and a color.
//! A [`World`] owns the objects it spawns and hands out their ids from its
//! own [`IdSequence`].

pub mod game_object;
pub mod world;

pub use game_object::{GameObject, GameObjectId, TransformComponent};
pub use world::{IdSequence, SceneError, World};
