//! The enclosure, its creatures and the camera looking at them.

mod animations;
mod camera_controller;
mod configs;
mod creature;
mod scene;

use bevy::prelude::*;

#[cfg(feature = "dev")]
pub use animations::{AnimationController, models::Creature};
pub use camera_controller::OrbitCamera;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        configs::plugin,
        scene::plugin,
        creature::plugin,
        camera_controller::plugin,
        animations::plugin,
    ));
}
