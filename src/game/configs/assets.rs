use std::marker::PhantomData;

use anyhow::ensure;
use bevy::{
    asset::{AssetLoader, LoadContext},
    prelude::*,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::game::animations::models::{ActorKind, ActorProfile};

/// Creature profiles and where to spawn them, loaded from RON
#[derive(Asset, Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatureConfig {
    pub profiles: Vec<ActorProfile>,
    pub spawns: Vec<SpawnPoint>,
}

/// One creature placed in the enclosure
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub kind: ActorKind,
    pub position: [f32; 3],
    /// Heading in degrees around the vertical axis
    #[serde(default)]
    pub heading_degrees: f32,
}

impl CreatureConfig {
    pub const PATH: &'static str = "config/demo.creatures.ron";

    /// Profile for `kind`, falling back to the built-in one
    pub fn profile(&self, kind: ActorKind) -> ActorProfile {
        self.profiles
            .iter()
            .find(|profile| profile.kind == kind)
            .cloned()
            .unwrap_or_else(|| ActorProfile::for_kind(kind))
    }
}

impl ConfigAsset for CreatureConfig {
    fn validate(&self) -> anyhow::Result<()> {
        for profile in &self.profiles {
            ensure!(
                profile.cross_fade_duration_secs.is_finite() && profile.cross_fade_duration_secs >= 0.0,
                "{:?} fade duration must be finite and non-negative",
                profile.kind
            );
            ensure!(
                profile.scale.is_finite() && profile.scale > 0.0,
                "{:?} scale must be finite and positive",
                profile.kind
            );
        }
        for spawn in &self.spawns {
            ensure!(
                spawn.position.iter().all(|v| v.is_finite()) && spawn.heading_degrees.is_finite(),
                "{:?} spawn point must be finite",
                spawn.kind
            );
        }
        Ok(())
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            profiles: vec![ActorProfile::tiger(), ActorProfile::hare()],
            spawns: vec![
                SpawnPoint {
                    kind: ActorKind::Tiger,
                    position: [-6.0, 0.0, 0.0],
                    heading_degrees: 0.0,
                },
                SpawnPoint {
                    kind: ActorKind::Hare,
                    position: [6.0, 0.0, 0.0],
                    heading_degrees: 0.0,
                },
            ],
        }
    }
}

/// Parameters of the enclosure the creatures live in
#[derive(Asset, Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneryConfig {
    pub seed: u64,
    pub ground_size: f32,
    pub wall_length: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    pub rock_count: usize,
    pub rock_radius: f32,
    pub tree_count: usize,
    /// Radius around the origin kept free of trees
    pub clearing_radius: f32,
}

impl SceneryConfig {
    pub const PATH: &'static str = "config/enclosure.scenery.ron";
}

impl ConfigAsset for SceneryConfig {
    fn validate(&self) -> anyhow::Result<()> {
        for (field, value) in [
            ("ground_size", self.ground_size),
            ("wall_length", self.wall_length),
            ("wall_height", self.wall_height),
            ("wall_thickness", self.wall_thickness),
            ("rock_radius", self.rock_radius),
        ] {
            ensure!(value.is_finite() && value > 0.0, "`{field}` must be finite and positive, got {value}");
        }
        ensure!(
            self.clearing_radius.is_finite() && self.clearing_radius >= 0.0,
            "`clearing_radius` must be finite and non-negative, got {}",
            self.clearing_radius
        );
        Ok(())
    }
}

impl Default for SceneryConfig {
    fn default() -> Self {
        Self {
            seed: 0x7193,
            ground_size: 1000.0,
            wall_length: 800.0,
            wall_height: 40.0,
            wall_thickness: 3.0,
            rock_count: 30,
            rock_radius: 2.0,
            tree_count: 60,
            clearing_radius: 40.0,
        }
    }
}

/// Sanity checks run on a config right after it is parsed
pub trait ConfigAsset {
    fn validate(&self) -> anyhow::Result<()>;
}

/// Asset loader for RON config files. Each config type gets its own
/// double extension (`.creatures.ron`, `.scenery.ron`).
pub struct RonConfigLoader<A> {
    extensions: &'static [&'static str],
    _marker: PhantomData<fn() -> A>,
}

impl<A> RonConfigLoader<A> {
    pub const fn new(extensions: &'static [&'static str]) -> Self {
        Self {
            extensions,
            _marker: PhantomData,
        }
    }
}

impl<A> AssetLoader for RonConfigLoader<A>
where
    A: Asset + ConfigAsset + DeserializeOwned,
{
    type Asset = A;
    type Settings = ();
    type Error = anyhow::Error;

    async fn load(
        &self,
        reader: &mut dyn bevy::asset::io::Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let config: A = ron::de::from_bytes(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }
}
