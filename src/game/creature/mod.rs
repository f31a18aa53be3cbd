use bevy::{prelude::*, scene::SceneInstanceReady};

use crate::{
    game::{
        animations::{
            AnimationController, CreatureModel, SceneSpawned,
            models::{ActorId, ActorProfile, Creature},
        },
        configs::{CreatureConfig, SpawnPoint},
    },
    screens::Screen,
};

// Creature spawn command
pub struct SpawnCreature {
    pub profile: ActorProfile,
    pub position: Vec3,
    pub heading: f32,
}

impl SpawnCreature {
    pub fn from_spawn_point(config: &CreatureConfig, spawn: &SpawnPoint) -> Self {
        Self {
            profile: config.profile(spawn.kind),
            position: Vec3::from_array(spawn.position),
            heading: spawn.heading_degrees.to_radians(),
        }
    }
}

impl Command for SpawnCreature {
    fn apply(self, world: &mut World) {
        let _ = world.run_system_cached_with(spawn_creature, self);
    }
}

fn spawn_creature(
    In(spawn_config): In<SpawnCreature>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut controller: ResMut<AnimationController>,
) {
    let SpawnCreature {
        profile,
        position,
        heading,
    } = spawn_config;
    let kind = profile.kind;

    let entity = commands
        .spawn((
            Name::new(kind.label()),
            Creature { kind },
            CreatureModel(asset_server.load(profile.model.clone())),
            DespawnOnExit(Screen::Gameplay),
            Transform::from_translation(position)
                .with_rotation(Quat::from_rotation_y(heading))
                .with_scale(Vec3::splat(profile.scale)),
            Visibility::Visible,
        ))
        .id();

    commands
        .spawn((
            Name::new(format!("{} Model", kind.label())),
            SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(profile.model.clone()))),
            ChildOf(entity),
        ))
        .observe(move |_: On<SceneInstanceReady>, mut commands: Commands| {
            commands.entity(entity).try_insert(SceneSpawned);
        });

    info!("Spawned {} at {}", kind.label(), position);
    controller.register(ActorId::from(entity), profile);
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), spawn_creatures);
}

fn spawn_creatures(mut commands: Commands, config: Res<CreatureConfig>) {
    for spawn in &config.spawns {
        commands.queue(SpawnCreature::from_spawn_point(&config, spawn));
    }
}
