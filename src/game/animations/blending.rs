use bevy::prelude::*;

use super::{
    animation_assets::ClipNodes,
    animation_controller::AnimationController,
    models::{ActorId, Creature},
};

/// Advances every creature's mixer clock by the real frame time
pub fn advance_mixers(
    time: Res<Time>,
    mut controller: ResMut<AnimationController>,
    creatures: Query<Entity, With<Creature>>,
) {
    let delta = time.delta_secs();
    for entity in &creatures {
        controller.update(ActorId::from(entity), delta);
    }
}

/// Writes each clip's position and effective weight into the creature's
/// `AnimationPlayer`.
///
/// The controller owns the clock, so active animations are kept paused and
/// seeked every frame. Silent clips are stopped.
pub fn apply_clip_weights(
    controller: Res<AnimationController>,
    creatures: Query<(Entity, &ClipNodes), With<Creature>>,
    mut animation_players: Query<&mut AnimationPlayer>,
) {
    for (entity, clip_nodes) in &creatures {
        let Some(animator) = controller.animator(ActorId::from(entity)) else {
            continue;
        };
        let Ok(mut animation_player) = animation_players.get_mut(clip_nodes.player) else {
            continue;
        };

        for clip in animator.clips() {
            let Some(&node) = clip_nodes.nodes.get(clip.name()) else {
                continue;
            };
            let weight = clip.effective_weight();
            if weight <= 0.0 {
                stop_animation(&mut animation_player, node);
                continue;
            }
            animation_player
                .play(node)
                .pause()
                .set_weight(weight)
                .seek_to(clip.time());
        }
    }
}

/// Stops an animation if it's currently playing
fn stop_animation(animation_player: &mut AnimationPlayer, node_index: AnimationNodeIndex) {
    if animation_player.is_playing_animation(node_index) {
        animation_player.stop(node_index);
    }
}
