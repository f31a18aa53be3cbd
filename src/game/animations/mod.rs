//! Walk/run animation of the creatures.

mod animation_assets;
mod animation_controller;
mod blending;
mod clip;
mod controls;
pub mod models;

use bevy::prelude::*;

use crate::screens::Screen;

pub use self::{
    animation_assets::{CreatureModel, SceneSpawned},
    animation_controller::AnimationController,
};
use self::{
    animation_assets::{bind_loaded_clips, reject_unanimated_models},
    blending::{advance_mixers, apply_clip_weights},
    controls::forward_key_events,
    models::{ActorId, Creature},
};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<AnimationController>();

    // Input, clock and sync must see each other's writes within the frame.
    app.add_systems(
        Update,
        (
            bind_loaded_clips,
            reject_unanimated_models,
            forward_key_events,
            advance_mixers,
            apply_clip_weights,
        )
            .chain()
            .run_if(in_state(Screen::Gameplay)),
    );
    app.add_systems(PostUpdate, forget_despawned_creatures);
}

fn forget_despawned_creatures(
    mut removed: RemovedComponents<Creature>,
    mut controller: ResMut<AnimationController>,
) {
    for entity in removed.read() {
        if controller.remove(ActorId::from(entity)).is_some() {
            debug!("Dropped animator for {}", ActorId::from(entity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::animations::models::{ActorKind, ActorProfile};

    #[test]
    fn test_despawned_creature_loses_its_animator() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<AnimationController>();
        app.add_systems(PostUpdate, forget_despawned_creatures);

        let tiger = app
            .world_mut()
            .spawn(Creature { kind: ActorKind::Tiger })
            .id();
        let hare = app
            .world_mut()
            .spawn(Creature { kind: ActorKind::Hare })
            .id();
        {
            let mut controller = app.world_mut().resource_mut::<AnimationController>();
            controller.register(ActorId::from(tiger), ActorProfile::tiger());
            controller.register(ActorId::from(hare), ActorProfile::hare());
        }

        app.world_mut().despawn(tiger);
        app.update();

        let controller = app.world().resource::<AnimationController>();
        assert!(controller.animator(ActorId::from(tiger)).is_none());
        assert!(controller.animator(ActorId::from(hare)).is_some());
    }
}
