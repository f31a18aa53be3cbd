mod enclosure;

use bevy::prelude::*;

use crate::{game::scene::enclosure::spawn_enclosure, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), spawn_enclosure);
}
