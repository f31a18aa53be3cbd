use bevy::{
    asset::RecursiveDependencyLoadState,
    gltf::Gltf,
    platform::collections::HashMap,
    prelude::*,
};

use super::{
    animation_controller::AnimationController,
    clip::ClipHandle,
    models::{ActorId, Creature},
};

/// The glTF a creature's rig and clips come from
#[derive(Component, Clone)]
pub struct CreatureModel(pub Handle<Gltf>);

/// Maps a creature's clip names to nodes of the graph attached to its
/// `AnimationPlayer`. Present once the clips are bound.
#[derive(Component, Debug)]
pub struct ClipNodes {
    pub player: Entity,
    pub nodes: HashMap<String, AnimationNodeIndex>,
}

/// Marks a creature whose model failed to load, so the failure is reported once
#[derive(Component)]
pub struct ModelLoadFailed;

/// Set on a creature once its model's scene has finished spawning
#[derive(Component)]
pub struct SceneSpawned;

fn report_load_failure(
    commands: &mut Commands,
    controller: &mut AnimationController,
    entity: Entity,
    creature: &Creature,
    reason: impl std::fmt::Display,
) {
    error!("{} model failed to load: {reason}", creature.kind.label());
    if let Err(err) = controller.on_load_failed(ActorId::from(entity)) {
        warn!("{err}");
    }
    commands.entity(entity).insert(ModelLoadFailed);
}

/// Waits for each creature's glTF and scene, then builds its animation graph
/// from the named clips and hands the clips to the controller.
pub fn bind_loaded_clips(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    animation_clips: Res<Assets<AnimationClip>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    mut controller: ResMut<AnimationController>,
    creatures: Query<
        (Entity, &Creature, &CreatureModel),
        (Without<ClipNodes>, Without<ModelLoadFailed>),
    >,
    children: Query<&Children>,
    animation_players: Query<(), With<AnimationPlayer>>,
) {
    for (entity, creature, model) in &creatures {
        let actor = ActorId::from(entity);

        match asset_server.recursive_dependency_load_state(&model.0) {
            RecursiveDependencyLoadState::Loaded => {}
            RecursiveDependencyLoadState::Failed(err) => {
                report_load_failure(&mut commands, &mut controller, entity, creature, err);
                continue;
            }
            _ => continue,
        }

        let Some(gltf) = gltfs.get(&model.0) else {
            continue;
        };

        // The scene instance spawns the player some frames after the glTF lands.
        // Scenes that never spawn one are handled by `reject_unanimated_models`.
        let Some(player) = children
            .iter_descendants(entity)
            .find(|descendant| animation_players.contains(*descendant))
        else {
            continue;
        };

        let mut named: Vec<(&str, &Handle<AnimationClip>)> = gltf
            .named_animations
            .iter()
            .map(|(name, handle)| (name.as_ref(), handle))
            .collect();
        named.sort_unstable_by(|a, b| a.0.cmp(b.0));
        if named.is_empty() {
            report_load_failure(
                &mut commands,
                &mut controller,
                entity,
                creature,
                "no named animations",
            );
            continue;
        }

        let (graph, node_indices) =
            AnimationGraph::from_clips(named.iter().map(|(_, handle)| (*handle).clone()));

        let mut nodes = HashMap::default();
        let mut clips = HashMap::default();
        for ((name, handle), node) in named.iter().zip(node_indices) {
            let duration = animation_clips
                .get(*handle)
                .map_or(0.0, |clip| clip.duration());
            nodes.insert(name.to_string(), node);
            clips.insert(name.to_string(), ClipHandle::new(*name, duration));
        }

        commands
            .entity(player)
            .insert(AnimationGraphHandle(graphs.add(graph)));
        commands.entity(entity).insert(ClipNodes { player, nodes });

        let mut summary: Vec<String> = clips
            .values()
            .map(|clip| format!("{} ({:.2}s)", clip.name(), clip.duration()))
            .collect();
        summary.sort();
        if let Err(err) = controller.on_clips_loaded(actor, clips) {
            warn!("{err}");
            continue;
        }
        if let Some(animator) = controller.animator(actor) {
            let profile = animator.profile();
            info!(
                "{} clips bound ({:?}, {:.2}s): {}",
                creature.kind.label(),
                profile.transition_style,
                profile.cross_fade_duration_secs,
                summary.join(", ")
            );
        }
    }
}

/// Fails creatures whose scene finished spawning without an `AnimationPlayer`
pub fn reject_unanimated_models(
    mut commands: Commands,
    mut controller: ResMut<AnimationController>,
    creatures: Query<
        (Entity, &Creature),
        (With<SceneSpawned>, Without<ClipNodes>, Without<ModelLoadFailed>),
    >,
    children: Query<&Children>,
    animation_players: Query<(), With<AnimationPlayer>>,
) {
    for (entity, creature) in &creatures {
        let has_player = children
            .iter_descendants(entity)
            .any(|descendant| animation_players.contains(descendant));
        if !has_player {
            report_load_failure(
                &mut commands,
                &mut controller,
                entity,
                creature,
                "scene has no animation player",
            );
        }
    }
}
