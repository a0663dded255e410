//! First-person keyboard movement

use glfw::Key;
use std::f32::consts::TAU;

use crate::foundation::math::Vec3;
use crate::render::vulkan::KeyInput;
use crate::scene::GameObject;

/// Pitch limit in radians, just short of straight up or down
const PITCH_LIMIT: f32 = 1.5;

/// Keys bound to each movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMappings {
    pub move_left: Key,
    pub move_right: Key,
    pub move_forward: Key,
    pub move_backward: Key,
    pub move_up: Key,
    pub move_down: Key,
    pub look_left: Key,
    pub look_right: Key,
    pub look_up: Key,
    pub look_down: Key,
}

impl Default for KeyMappings {
    fn default() -> Self {
        Self {
            move_left: Key::A,
            move_right: Key::D,
            move_forward: Key::W,
            move_backward: Key::S,
            move_up: Key::E,
            move_down: Key::Q,
            look_left: Key::Left,
            look_right: Key::Right,
            look_up: Key::Up,
            look_down: Key::Down,
        }
    }
}

/// Moves a game object in the XZ plane from keyboard state
#[derive(Debug, Clone)]
pub struct KeyboardMovementController {
    pub keys: KeyMappings,
    /// Units per second
    pub move_speed: f32,
    /// Radians per second
    pub look_speed: f32,
}

impl Default for KeyboardMovementController {
    fn default() -> Self {
        Self {
            keys: KeyMappings::default(),
            move_speed: 3.0,
            look_speed: 1.5,
        }
    }
}

impl KeyboardMovementController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one frame of look and movement input to `object`
    ///
    /// Looking changes yaw and pitch. Movement is relative to the new yaw
    /// and ignores pitch, so the object stays level while walking.
    pub fn move_in_plane_xz<K: KeyInput + ?Sized>(
        &self,
        input: &K,
        dt: f32,
        object: &mut GameObject,
    ) {
        let axis = |positive: Key, negative: Key| -> f32 {
            let mut value = 0.0;
            if input.is_pressed(positive) {
                value += 1.0;
            }
            if input.is_pressed(negative) {
                value -= 1.0;
            }
            value
        };

        let rotate = Vec3::new(
            axis(self.keys.look_up, self.keys.look_down),
            axis(self.keys.look_right, self.keys.look_left),
            0.0,
        );
        if rotate.norm_squared() > f32::EPSILON {
            object.transform.rotation += rotate.normalize() * (self.look_speed * dt);
        }

        let rotation = &mut object.transform.rotation;
        rotation.x = rotation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        rotation.y = rotation.y.rem_euclid(TAU);

        let yaw = rotation.y;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        let up = Vec3::new(0.0, -1.0, 0.0);

        let move_dir = forward * axis(self.keys.move_forward, self.keys.move_backward)
            + right * axis(self.keys.move_right, self.keys.move_left)
            + up * axis(self.keys.move_up, self.keys.move_down);
        if move_dir.norm_squared() > f32::EPSILON {
            object.transform.translation += move_dir.normalize() * (self.move_speed * dt);
        }
    }
}
