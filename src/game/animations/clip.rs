use bevy::prelude::*;

/// A scheduled change of a clip's weight multiplier over time
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Fade {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn factor(&self) -> f32 {
        self.from + (self.to - self.from) * self.progress()
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn advance(&mut self, delta: f32) {
        self.elapsed += delta;
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Playback state of one named clip bound to an actor.
///
/// The controller owns these and is the only clock: the engine's animation
/// player is told where each clip is and how much it weighs every frame.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct ClipHandle {
    name: String,
    /// Clip length in seconds, `0` when unknown
    duration: f32,
    time: f32,
    weight: f32,
    enabled: bool,
    looping: bool,
    playing: bool,
    fade: Option<Fade>,
    /// Set while a crossfade blend drives this clip from the outside
    blend: Option<f32>,
}

impl ClipHandle {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            time: 0.0,
            weight: 1.0,
            enabled: true,
            looping: true,
            playing: false,
            fade: None,
            blend: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Base weight, before fades and blends are applied
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    /// The weight the mixer should use right now
    pub fn effective_weight(&self) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        let fade = self.fade.map_or(1.0, |fade| fade.factor());
        let blend = self.blend.unwrap_or(1.0);
        (self.weight * fade * blend).clamp(0.0, 1.0)
    }

    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self
    }

    /// Rewinds to the start, enables the clip at full weight, drops any fade.
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self.weight = 1.0;
        self.enabled = true;
        self.fade = None;
        self
    }

    /// Silences the clip until the next `reset`.
    pub fn stop(&mut self) -> &mut Self {
        self.playing = false;
        self.enabled = false;
        self.fade = None;
        self.blend = None;
        self
    }

    pub fn set_effective_weight(&mut self, weight: f32) -> &mut Self {
        self.weight = weight.clamp(0.0, 1.0);
        self.enabled = true;
        self.fade = None;
        self
    }

    pub fn fade_in(&mut self, duration: f32) -> &mut Self {
        self.enabled = true;
        self.fade = Some(Fade::new(0.0, 1.0, duration));
        self
    }

    /// Fades from wherever the clip currently stands down to silence.
    pub fn fade_out(&mut self, duration: f32) -> &mut Self {
        let start = self.fade.map_or(1.0, |fade| fade.factor()) * self.blend.unwrap_or(1.0);
        self.blend = None;
        self.fade = Some(Fade::new(start, 0.0, duration));
        self
    }

    pub(crate) fn set_blend(&mut self, factor: Option<f32>) {
        self.blend = factor.map(|factor| factor.clamp(0.0, 1.0));
    }

    /// Advances the clip's own clock and fade. Blends are advanced by their owner.
    pub(crate) fn advance(&mut self, delta: f32) {
        if self.playing && self.enabled {
            self.time += delta;
            if self.duration > 0.0 && self.time >= self.duration {
                if self.looping {
                    self.time = self.time.rem_euclid(self.duration);
                } else {
                    self.time = self.duration;
                    self.playing = false;
                }
            }
        }

        if let Some(fade) = self.fade.as_mut() {
            fade.advance(delta);
            if fade.is_finished() {
                let target = fade.target();
                self.fade = None;
                if target <= 0.0 {
                    self.enabled = false;
                } else {
                    self.weight = (self.weight * target).clamp(0.0, 1.0);
                }
            }
        }
    }

    /// Ends an external blend on the outgoing side.
    pub(crate) fn finish_blend_out(&mut self) {
        self.blend = None;
        self.enabled = false;
    }
}
