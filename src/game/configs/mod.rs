pub mod assets;

use bevy::prelude::*;

use crate::asset_tracking::LoadResource;

pub use assets::{CreatureConfig, RonConfigLoader, SceneryConfig, SpawnPoint};

/// Handle to the creature config file, resolved during the loading screen
#[derive(Resource, Asset, Reflect, Clone)]
pub struct CreatureConfigAsset {
    #[dependency]
    handle: Handle<CreatureConfig>,
}

impl FromWorld for CreatureConfigAsset {
    fn from_world(world: &mut World) -> Self {
        Self {
            handle: world.resource::<AssetServer>().load(CreatureConfig::PATH),
        }
    }
}

/// Handle to the scenery config file, resolved during the loading screen
#[derive(Resource, Asset, Reflect, Clone)]
pub struct SceneryConfigAsset {
    #[dependency]
    handle: Handle<SceneryConfig>,
}

impl FromWorld for SceneryConfigAsset {
    fn from_world(world: &mut World) -> Self {
        Self {
            handle: world.resource::<AssetServer>().load(SceneryConfig::PATH),
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.init_asset::<CreatureConfig>();
    app.init_asset::<SceneryConfig>();
    app.register_asset_loader(RonConfigLoader::<CreatureConfig>::new(&["creatures.ron"]));
    app.register_asset_loader(RonConfigLoader::<SceneryConfig>::new(&["scenery.ron"]));

    // Built-in defaults stand in until (or unless) each file loads.
    app.init_resource::<CreatureConfig>();
    app.init_resource::<SceneryConfig>();

    app.load_resource::<CreatureConfigAsset>();
    app.load_resource::<SceneryConfigAsset>();
    app.add_systems(
        Update,
        (
            apply_creature_config.run_if(resource_added::<CreatureConfigAsset>),
            apply_scenery_config.run_if(resource_added::<SceneryConfigAsset>),
        ),
    );
}

fn apply_creature_config(
    mut commands: Commands,
    loaded: Res<CreatureConfigAsset>,
    configs: Res<Assets<CreatureConfig>>,
) {
    if let Some(config) = configs.get(&loaded.handle) {
        info!(
            "Loaded {} creature profiles, {} spawn points",
            config.profiles.len(),
            config.spawns.len()
        );
        commands.insert_resource(config.clone());
    }
}

fn apply_scenery_config(
    mut commands: Commands,
    loaded: Res<SceneryConfigAsset>,
    configs: Res<Assets<SceneryConfig>>,
) {
    if let Some(config) = configs.get(&loaded.handle) {
        info!("Loaded scenery config (seed {})", config.seed);
        commands.insert_resource(config.clone());
    }
}
