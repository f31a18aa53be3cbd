use bevy::{
    platform::collections::{HashMap, HashSet},
    prelude::*,
};
use thiserror::Error;

use super::{
    clip::{ClipHandle, Fade},
    models::{ActorId, ActorProfile, AnimationPhase, Gait, TransitionStyle},
};

/// Conditions the controller recovers from locally. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("{0} is not registered with the animation controller")]
    UnknownActor(ActorId),
    #[error("{0} already has its clips bound, ignoring the rebind")]
    AlreadyBound(ActorId),
    #[error("{actor} has no clip named `{clip}`")]
    MissingClip { actor: ActorId, clip: String },
    #[error("{0} released the run key with no clip to return to")]
    MissingPrevious(ActorId),
    #[error("{0} loaded without any clips, treating it as a failed load")]
    NoClips(ActorId),
}

/// What a key event did to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    /// Not a run-key edge, or the actor can't transition yet
    Ignored,
    Transitioned(AnimationPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoadStatus {
    #[default]
    Pending,
    Loaded,
    Failed,
}

/// A single blended crossfade: one clock, outgoing weight `1 - t`, incoming `t`.
#[derive(Debug, Clone, PartialEq)]
struct Blend {
    outgoing: String,
    incoming: String,
    clock: Fade,
}

/// Mutable per-actor transition state
#[derive(Debug, Clone, Default)]
pub struct TransitionState {
    current: Option<String>,
    previous: Option<String>,
    gait: Gait,
    blend: Option<Blend>,
    held_keys: HashSet<String>,
}

impl TransitionState {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn gait(&self) -> Gait {
        self.gait
    }
}

/// Animation record of one creature: its profile, bound clips, and state.
#[derive(Debug, Clone)]
pub struct ActorAnimator {
    profile: ActorProfile,
    status: LoadStatus,
    clips: HashMap<String, ClipHandle>,
    state: TransitionState,
}

impl ActorAnimator {
    fn new(profile: ActorProfile) -> Self {
        Self {
            profile,
            status: LoadStatus::default(),
            clips: HashMap::default(),
            state: TransitionState::default(),
        }
    }

    pub fn profile(&self) -> &ActorProfile {
        &self.profile
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.status == LoadStatus::Loaded
    }

    pub fn clip(&self, name: &str) -> Option<&ClipHandle> {
        self.clips.get(name)
    }

    pub fn clips(&self) -> impl Iterator<Item = &ClipHandle> {
        self.clips.values()
    }

    pub fn current_clip(&self) -> Option<&ClipHandle> {
        self.state.current.as_deref().and_then(|name| self.clips.get(name))
    }

    /// True while any fade or blend is still in flight
    pub fn is_transitioning(&self) -> bool {
        self.state.blend.is_some() || self.clips.values().any(ClipHandle::is_fading)
    }

    pub fn phase(&self) -> AnimationPhase {
        match self.status {
            LoadStatus::Pending => AnimationPhase::Unloaded,
            LoadStatus::Failed => AnimationPhase::Failed,
            LoadStatus::Loaded => match (self.state.gait, self.is_transitioning()) {
                (Gait::Walking, false) => AnimationPhase::Idle,
                (Gait::Walking, true) => AnimationPhase::ToWalk,
                (Gait::Running, true) => AnimationPhase::ToRun,
                (Gait::Running, false) => AnimationPhase::Running,
            },
        }
    }

    fn bind(&mut self, actor: ActorId, clips: HashMap<String, ClipHandle>) -> Result<(), AnimationError> {
        self.clips = clips;
        self.status = LoadStatus::Loaded;

        let walk = self.profile.walk_clip.clone();
        for clip in self.clips.values_mut().filter(|clip| clip.name() != walk) {
            clip.stop();
        }
        let Some(clip) = self.clips.get_mut(&walk) else {
            return Err(AnimationError::MissingClip { actor, clip: walk });
        };
        clip.reset().play();
        self.state.current = Some(walk);
        Ok(())
    }

    fn start_run(&mut self, actor: ActorId) -> Result<KeyResponse, AnimationError> {
        let run = self.profile.run_clip.clone();
        if !self.clips.contains_key(&run) {
            return Err(AnimationError::MissingClip { actor, clip: run });
        }
        let duration = self.profile.cross_fade_duration_secs;
        let outgoing = self.state.current.take();
        self.cancel_blend();

        match self.profile.transition_style {
            TransitionStyle::HardCut => {
                if let Some(clip) = outgoing.as_deref().and_then(|name| self.clips.get_mut(name)) {
                    clip.fade_out(duration);
                }
                if let Some(clip) = self.clips.get_mut(&run) {
                    clip.reset().fade_in(duration).play();
                }
            }
            TransitionStyle::CrossFade => {
                // The blend does not carry enabled/weight over for this rig, so
                // the incoming side must already be at full weight.
                if let Some(clip) = self.clips.get_mut(&run) {
                    clip.reset().set_effective_weight(1.0).play();
                }
                match outgoing.as_deref() {
                    Some(from) if from != run => {
                        self.state.blend = Some(Blend {
                            outgoing: from.to_owned(),
                            incoming: run.clone(),
                            clock: Fade::new(0.0, 1.0, duration),
                        });
                        self.apply_blend();
                    }
                    _ => {}
                }
            }
        }

        self.state.previous = outgoing;
        self.state.current = Some(run);
        self.state.gait = Gait::Running;
        Ok(KeyResponse::Transitioned(self.phase()))
    }

    fn stop_run(&mut self, actor: ActorId) -> Result<KeyResponse, AnimationError> {
        let Some(previous) = self.state.previous.clone() else {
            return Err(AnimationError::MissingPrevious(actor));
        };
        if !self.clips.contains_key(&previous) {
            return Err(AnimationError::MissingClip { actor, clip: previous });
        }
        // Fade out before dropping the blend so the run clip leaves from the
        // level the blend had reached.
        let duration = self.profile.cross_fade_duration_secs;
        if let Some(run) = self.state.current.take() {
            if run != previous {
                if let Some(clip) = self.clips.get_mut(&run) {
                    clip.fade_out(duration);
                }
            }
        }
        self.cancel_blend();
        if let Some(clip) = self.clips.get_mut(&previous) {
            clip.reset().play();
        }

        self.state.current = Some(previous);
        self.state.previous = None;
        self.state.gait = Gait::Walking;
        Ok(KeyResponse::Transitioned(self.phase()))
    }

    fn apply_blend(&mut self) {
        let Some(blend) = self.state.blend.as_ref() else {
            return;
        };
        let t = blend.clock.factor();
        let (outgoing, incoming) = (blend.outgoing.clone(), blend.incoming.clone());
        if let Some(clip) = self.clips.get_mut(&outgoing) {
            clip.set_blend(Some(1.0 - t));
        }
        if let Some(clip) = self.clips.get_mut(&incoming) {
            clip.set_blend(Some(t));
        }
    }

    fn cancel_blend(&mut self) {
        if let Some(blend) = self.state.blend.take() {
            for name in [&blend.outgoing, &blend.incoming] {
                if let Some(clip) = self.clips.get_mut(name) {
                    clip.set_blend(None);
                }
            }
        }
    }

    fn advance(&mut self, delta: f32) {
        for clip in self.clips.values_mut() {
            clip.advance(delta);
        }

        let finished = match self.state.blend.as_mut() {
            Some(blend) => {
                blend.clock.advance(delta);
                blend.clock.is_finished()
            }
            None => return,
        };
        if finished {
            if let Some(blend) = self.state.blend.take() {
                if let Some(clip) = self.clips.get_mut(&blend.outgoing) {
                    clip.finish_blend_out();
                }
                if let Some(clip) = self.clips.get_mut(&blend.incoming) {
                    clip.set_blend(None);
                }
            }
        } else {
            self.apply_blend();
        }
    }
}

/// Owns every creature's clips and decides walk/run transitions from key edges.
///
/// Requests for actors whose clips have not arrived are quiet no-ops; anything
/// else that can't be honoured comes back as an [`AnimationError`] for the
/// caller to log. No request ever touches another actor's state.
#[derive(Resource, Debug, Default)]
pub struct AnimationController {
    actors: HashMap<ActorId, ActorAnimator>,
}

impl AnimationController {
    pub fn register(&mut self, actor: ActorId, profile: ActorProfile) {
        self.actors.insert(actor, ActorAnimator::new(profile));
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<ActorAnimator> {
        self.actors.remove(&actor)
    }

    pub fn animator(&self, actor: ActorId) -> Option<&ActorAnimator> {
        self.actors.get(&actor)
    }

    /// Binds freshly loaded clips and starts the walk clip at full weight.
    /// An empty clip set counts as a failed load.
    pub fn on_clips_loaded(
        &mut self,
        actor: ActorId,
        clips: HashMap<String, ClipHandle>,
    ) -> Result<(), AnimationError> {
        let animator = self.animator_mut(actor)?;
        if animator.status != LoadStatus::Pending {
            return Err(AnimationError::AlreadyBound(actor));
        }
        if clips.is_empty() {
            animator.status = LoadStatus::Failed;
            return Err(AnimationError::NoClips(actor));
        }
        animator.bind(actor, clips)
    }

    /// The actor's assets never arrived; it stays un-animated.
    pub fn on_load_failed(&mut self, actor: ActorId) -> Result<(), AnimationError> {
        let animator = self.animator_mut(actor)?;
        if animator.status == LoadStatus::Pending {
            animator.status = LoadStatus::Failed;
        }
        Ok(())
    }

    pub fn on_key_down(&mut self, actor: ActorId, key: &str) -> Result<KeyResponse, AnimationError> {
        let animator = self.animator_mut(actor)?;
        if !animator.state.held_keys.insert(key.to_owned()) {
            return Ok(KeyResponse::Ignored);
        }
        if key != animator.profile.run_key
            || !animator.is_loaded()
            || animator.state.gait == Gait::Running
        {
            return Ok(KeyResponse::Ignored);
        }
        animator.start_run(actor)
    }

    pub fn on_key_up(&mut self, actor: ActorId, key: &str) -> Result<KeyResponse, AnimationError> {
        let animator = self.animator_mut(actor)?;
        animator.state.held_keys.remove(key);
        if key != animator.profile.run_key
            || !animator.is_loaded()
            || animator.state.gait != Gait::Running
        {
            return Ok(KeyResponse::Ignored);
        }
        animator.stop_run(actor)
    }

    /// Advances the actor's mixer clock. Call once per frame with the real
    /// frame time.
    pub fn update(&mut self, actor: ActorId, delta_secs: f32) {
        let Some(animator) = self.actors.get_mut(&actor) else {
            return;
        };
        if !animator.is_loaded() {
            return;
        }
        let delta = if delta_secs.is_finite() { delta_secs.max(0.0) } else { 0.0 };
        animator.advance(delta);
    }

    fn animator_mut(&mut self, actor: ActorId) -> Result<&mut ActorAnimator, AnimationError> {
        self.actors
            .get_mut(&actor)
            .ok_or(AnimationError::UnknownActor(actor))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const HARE: ActorId = ActorId(1);
    const TIGER: ActorId = ActorId(2);

    fn clip_set(names: &[&str]) -> HashMap<String, ClipHandle> {
        names
            .iter()
            .map(|name| (name.to_string(), ClipHandle::new(*name, 1.0)))
            .collect()
    }

    fn loaded_controller() -> AnimationController {
        let mut controller = AnimationController::default();
        controller.register(HARE, ActorProfile::hare());
        controller.register(TIGER, ActorProfile::tiger());
        controller.on_clips_loaded(HARE, clip_set(&["walk", "run"])).unwrap();
        controller.on_clips_loaded(TIGER, clip_set(&["Walk", "Run"])).unwrap();
        controller
    }

    /// Clips with a non-zero effective weight
    fn audible(controller: &AnimationController, actor: ActorId) -> Vec<String> {
        let mut names: Vec<String> = controller
            .animator(actor)
            .unwrap()
            .clips()
            .filter(|clip| clip.effective_weight() > 0.0)
            .map(|clip| clip.name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_update_before_load_is_noop() {
        let mut controller = AnimationController::default();
        controller.register(HARE, ActorProfile::hare());
        controller.update(HARE, 0.016);
        controller.update(ActorId(99), 0.016);

        let animator = controller.animator(HARE).unwrap();
        assert_eq!(animator.phase(), AnimationPhase::Unloaded);
        assert_eq!(animator.clips().count(), 0);
    }

    #[test]
    fn test_keys_before_load_are_ignored() {
        let mut controller = AnimationController::default();
        controller.register(HARE, ActorProfile::hare());

        assert_eq!(controller.on_key_down(HARE, "w"), Ok(KeyResponse::Ignored));
        assert_eq!(controller.on_key_up(HARE, "w"), Ok(KeyResponse::Ignored));
        assert!(controller.animator(HARE).unwrap().state().current().is_none());
    }

    #[test]
    fn test_load_starts_walk_at_full_weight() {
        let controller = loaded_controller();
        let animator = controller.animator(HARE).unwrap();
        let walk = animator.current_clip().unwrap();

        assert_eq!(walk.name(), "walk");
        assert!(walk.is_playing());
        assert_eq!(walk.effective_weight(), 1.0);
        assert_eq!(animator.phase(), AnimationPhase::Idle);
        assert!(!animator.clip("run").unwrap().is_playing());
        assert_eq!(audible(&controller, HARE), vec!["walk".to_string()]);
        assert_eq!(audible(&controller, TIGER), vec!["Walk".to_string()]);
    }

    #[test]
    fn test_empty_clip_set_fails_the_load() {
        let mut controller = AnimationController::default();
        controller.register(HARE, ActorProfile::hare());

        let bound = controller.on_clips_loaded(HARE, HashMap::default());
        assert_eq!(bound, Err(AnimationError::NoClips(HARE)));

        let animator = controller.animator(HARE).unwrap();
        assert_eq!(animator.phase(), AnimationPhase::Failed);
        assert!(!animator.is_loaded());
        assert_eq!(controller.on_key_down(HARE, "w"), Ok(KeyResponse::Ignored));
        assert_eq!(controller.on_key_up(HARE, "w"), Ok(KeyResponse::Ignored));
    }

    #[test]
    fn test_second_load_is_rejected() {
        let mut controller = loaded_controller();
        let result = controller.on_clips_loaded(HARE, clip_set(&["other"]));

        assert_eq!(result, Err(AnimationError::AlreadyBound(HARE)));
        assert!(controller.animator(HARE).unwrap().clip("walk").is_some());
    }

    #[test]
    fn test_repeated_key_down_transitions_once() {
        let mut controller = loaded_controller();

        let first = controller.on_key_down(HARE, "w").unwrap();
        let second = controller.on_key_down(HARE, "w").unwrap();

        assert!(matches!(first, KeyResponse::Transitioned(_)));
        assert_eq!(second, KeyResponse::Ignored);
        assert_eq!(controller.animator(HARE).unwrap().state().previous(), Some("walk"));
    }

    #[test]
    fn test_press_release_round_trip_restores_walk() {
        let mut controller = loaded_controller();
        controller.on_key_down(TIGER, "w").unwrap();
        controller.on_key_up(TIGER, "w").unwrap();

        let animator = controller.animator(TIGER).unwrap();
        let current = animator.current_clip().unwrap();
        assert_eq!(current.name(), "Walk");
        assert_eq!(current.weight(), 1.0);
        assert!(current.is_enabled());
        assert_eq!(current.effective_weight(), 1.0);
        assert!(animator.state().previous().is_none());
    }

    #[test]
    fn test_hard_cut_fades_both_clips() {
        let mut controller = loaded_controller();
        controller.on_key_down(TIGER, "w").unwrap();

        let animator = controller.animator(TIGER).unwrap();
        let walk = animator.clip("Walk").unwrap();
        let run = animator.clip("Run").unwrap();
        assert!(walk.is_fading());
        assert!(run.is_fading());
        assert_eq!(walk.effective_weight(), 1.0);
        assert_eq!(run.effective_weight(), 0.0);
        assert_eq!(animator.phase(), AnimationPhase::ToRun);

        controller.update(TIGER, 0.25);
        let animator = controller.animator(TIGER).unwrap();
        assert_relative_eq!(animator.clip("Walk").unwrap().effective_weight(), 0.5, epsilon = 1e-5);
        assert_relative_eq!(animator.clip("Run").unwrap().effective_weight(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_cross_fade_forces_run_weight_before_blend() {
        let mut controller = loaded_controller();
        controller.on_key_down(HARE, "w").unwrap();

        let animator = controller.animator(HARE).unwrap();
        let run = animator.clip("run").unwrap();
        assert_eq!(run.weight(), 1.0);
        assert!(run.is_enabled());
        assert!(run.is_blending());
        assert!(!run.is_fading());
        assert!(animator.clip("walk").unwrap().is_blending());
    }

    #[test]
    fn test_cross_fade_shares_one_clock() {
        let mut controller = loaded_controller();
        controller.on_key_down(HARE, "w").unwrap();
        controller.update(HARE, 0.1);

        let animator = controller.animator(HARE).unwrap();
        let walk = animator.clip("walk").unwrap().effective_weight();
        let run = animator.clip("run").unwrap().effective_weight();
        assert_relative_eq!(walk + run, 1.0, epsilon = 1e-5);
        assert_relative_eq!(run, 0.1 / 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_hare_scenario() {
        let mut controller = loaded_controller();

        controller.on_key_down(HARE, "w").unwrap();
        let state = controller.animator(HARE).unwrap().state();
        assert_eq!(state.current(), Some("run"));
        assert_eq!(state.previous(), Some("walk"));
        assert_eq!(state.gait(), Gait::Running);

        controller.on_key_up(HARE, "w").unwrap();
        let state = controller.animator(HARE).unwrap().state();
        assert_eq!(state.current(), Some("walk"));
        assert_eq!(state.previous(), None);
        assert_eq!(state.gait(), Gait::Walking);
    }

    #[test]
    fn test_key_up_at_rest_changes_nothing() {
        let mut controller = loaded_controller();
        let before = controller.animator(HARE).unwrap().state().clone();

        assert_eq!(controller.on_key_up(HARE, "w"), Ok(KeyResponse::Ignored));

        let after = controller.animator(HARE).unwrap().state();
        assert_eq!(after.current(), before.current());
        assert_eq!(after.previous(), before.previous());
        assert_eq!(after.gait(), before.gait());
    }

    #[test]
    fn test_steady_state_has_single_weighted_clip() {
        let mut controller = loaded_controller();
        for actor in [HARE, TIGER] {
            controller.on_key_down(actor, "w").unwrap();
            controller.update(actor, 1.0);
        }
        assert_eq!(audible(&controller, HARE), vec!["run".to_string()]);
        assert_eq!(audible(&controller, TIGER), vec!["Run".to_string()]);
        assert_eq!(controller.animator(TIGER).unwrap().phase(), AnimationPhase::Running);

        for actor in [HARE, TIGER] {
            controller.on_key_up(actor, "w").unwrap();
        }
        assert_eq!(controller.animator(HARE).unwrap().phase(), AnimationPhase::ToWalk);
        for actor in [HARE, TIGER] {
            controller.update(actor, 1.0);
        }
        assert_eq!(audible(&controller, HARE), vec!["walk".to_string()]);
        assert_eq!(audible(&controller, TIGER), vec!["Walk".to_string()]);
        assert_eq!(controller.animator(HARE).unwrap().phase(), AnimationPhase::Idle);
    }

    #[test]
    fn test_release_mid_blend_cancels_it() {
        let mut controller = loaded_controller();
        controller.on_key_down(HARE, "w").unwrap();
        controller.update(HARE, 0.1);
        controller.on_key_up(HARE, "w").unwrap();

        let animator = controller.animator(HARE).unwrap();
        let walk = animator.clip("walk").unwrap();
        assert!(!walk.is_blending());
        assert_eq!(walk.effective_weight(), 1.0);
        assert!(animator.clip("run").unwrap().is_fading());
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let mut controller = loaded_controller();
        assert_eq!(controller.on_key_down(HARE, "space"), Ok(KeyResponse::Ignored));
        assert_eq!(controller.on_key_up(HARE, "space"), Ok(KeyResponse::Ignored));
        assert_eq!(controller.animator(HARE).unwrap().state().gait(), Gait::Walking);
    }

    #[test]
    fn test_missing_run_clip_is_reported() {
        let mut controller = AnimationController::default();
        controller.register(HARE, ActorProfile::hare());
        controller.on_clips_loaded(HARE, clip_set(&["walk"])).unwrap();

        let result = controller.on_key_down(HARE, "w");
        assert_eq!(
            result,
            Err(AnimationError::MissingClip { actor: HARE, clip: "run".into() })
        );
        assert_eq!(controller.animator(HARE).unwrap().state().current(), Some("walk"));
    }

    #[test]
    fn test_missing_walk_clip_leaves_nothing_to_return_to() {
        let mut controller = AnimationController::default();
        controller.register(HARE, ActorProfile::hare());
        let bound = controller.on_clips_loaded(HARE, clip_set(&["run"]));
        assert!(matches!(bound, Err(AnimationError::MissingClip { .. })));

        controller.on_key_down(HARE, "w").unwrap();
        let released = controller.on_key_up(HARE, "w");

        assert_eq!(released, Err(AnimationError::MissingPrevious(HARE)));
        let state = controller.animator(HARE).unwrap().state();
        assert_eq!(state.current(), Some("run"));
        assert_eq!(state.gait(), Gait::Running);
    }

    #[test]
    fn test_failed_load_keeps_actor_inert() {
        let mut controller = AnimationController::default();
        controller.register(TIGER, ActorProfile::tiger());
        controller.on_load_failed(TIGER).unwrap();

        assert_eq!(controller.on_key_down(TIGER, "w"), Ok(KeyResponse::Ignored));
        controller.update(TIGER, 0.5);
        assert_eq!(controller.animator(TIGER).unwrap().phase(), AnimationPhase::Failed);
        assert_eq!(
            controller.on_clips_loaded(TIGER, clip_set(&["Walk"])),
            Err(AnimationError::AlreadyBound(TIGER))
        );
    }

    #[test]
    fn test_unknown_actor_is_reported() {
        let mut controller = AnimationController::default();
        assert_eq!(
            controller.on_key_down(ActorId(7), "w"),
            Err(AnimationError::UnknownActor(ActorId(7)))
        );
    }

    #[test]
    fn test_bad_deltas_do_not_move_clock() {
        let mut controller = loaded_controller();
        controller.update(HARE, -1.0);
        controller.update(HARE, f32::NAN);
        assert_eq!(controller.animator(HARE).unwrap().current_clip().unwrap().time(), 0.0);

        controller.update(HARE, 0.25);
        assert_relative_eq!(
            controller.animator(HARE).unwrap().current_clip().unwrap().time(),
            0.25,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_actors_are_independent() {
        let mut controller = loaded_controller();
        controller.on_key_down(TIGER, "w").unwrap();
        assert_eq!(controller.animator(HARE).unwrap().state().gait(), Gait::Walking);

        controller.remove(TIGER);
        assert!(controller.animator(TIGER).is_none());
        controller.update(TIGER, 0.1);
        controller.update(HARE, 0.1);
    }
}
