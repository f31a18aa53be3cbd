//! The screen state for the main gameplay.

use bevy::prelude::*;

use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), log_controls);
}

fn log_controls() {
    info!("Hold W to run. Left drag orbits, right drag pans, wheel zooms.");
}
