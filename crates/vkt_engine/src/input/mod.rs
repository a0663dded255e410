//! Keyboard input
//!
//! Key state is read through [`KeyInput`](crate::render::vulkan::KeyInput) so
//! controllers can be driven by a real window or by a test double.

pub mod keyboard_controller;

pub use keyboard_controller::{KeyMappings, KeyboardMovementController};
