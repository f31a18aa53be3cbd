use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifies one animated creature. Derived from its entity so despawns can
/// be traced back to the controller record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct ActorId(pub u64);

impl From<Entity> for ActorId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// The creature rigs the demo knows how to animate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum ActorKind {
    Tiger,
    Hare,
}

impl ActorKind {
    pub fn label(self) -> &'static str {
        match self {
            ActorKind::Tiger => "Tiger",
            ActorKind::Hare => "Hare",
        }
    }
}

/// How a creature moves from its walk clip to its run clip.
///
/// The two rigs react differently to the mixer: the tiger's weights desync
/// under a single blended crossfade, so it gets two independent fades
/// instead. Keep this per profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum TransitionStyle {
    /// Fade the outgoing clip out and the incoming clip in, each on its own clock.
    HardCut,
    /// One blend clock drives both sides; the incoming clip is reset to full
    /// weight before the blend starts.
    CrossFade,
}

/// Static animation configuration for one creature kind
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
pub struct ActorProfile {
    pub kind: ActorKind,
    /// glTF file holding the rig, its scene and its named clips
    pub model: String,
    pub walk_clip: String,
    pub run_clip: String,
    pub transition_style: TransitionStyle,
    pub cross_fade_duration_secs: f32,
    /// Lowercase key token that makes the creature run while held
    pub run_key: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl ActorProfile {
    pub fn tiger() -> Self {
        Self {
            kind: ActorKind::Tiger,
            model: "models/tiger/scene.gltf".into(),
            walk_clip: "Walk".into(),
            run_clip: "Run".into(),
            transition_style: TransitionStyle::HardCut,
            cross_fade_duration_secs: 0.5,
            run_key: "w".into(),
            scale: 1.0,
        }
    }

    pub fn hare() -> Self {
        Self {
            kind: ActorKind::Hare,
            model: "models/hare/scene.gltf".into(),
            walk_clip: "walk".into(),
            run_clip: "run".into(),
            transition_style: TransitionStyle::CrossFade,
            cross_fade_duration_secs: 0.3,
            run_key: "w".into(),
            scale: 1.0,
        }
    }

    pub fn for_kind(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Tiger => Self::tiger(),
            ActorKind::Hare => Self::hare(),
        }
    }
}

/// Walking or running. Replaces the `isWalking`/`isRunning` flag pair so the
/// two can never be true at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Gait {
    #[default]
    Walking,
    Running,
}

/// Observable animation phase of a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum AnimationPhase {
    /// Clips not bound yet
    #[default]
    Unloaded,
    /// Clips never arrived
    Failed,
    Idle,
    ToRun,
    Running,
    ToWalk,
}

impl fmt::Display for AnimationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnimationPhase::Unloaded => "unloaded",
            AnimationPhase::Failed => "failed",
            AnimationPhase::Idle => "idle",
            AnimationPhase::ToRun => "to run",
            AnimationPhase::Running => "running",
            AnimationPhase::ToWalk => "to walk",
        };
        f.write_str(label)
    }
}

/// Marker for a spawned creature
#[derive(Component, Debug, Clone, Copy)]
pub struct Creature {
    pub kind: ActorKind,
}
