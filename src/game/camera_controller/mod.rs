use bevy::{
    input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
};

const ROTATE_SENSITIVITY: f32 = 0.005; // radians per pixel
const PAN_SENSITIVITY: f32 = 0.0015; // fraction of radius per pixel
const ZOOM_STEP: f32 = 0.95; // radius scale per wheel line
const PIXELS_PER_LINE: f32 = 100.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera around a target point, with damped rotation, pan and zoom.
///
/// Input accumulates into a pending delta. Each frame `damping_factor` of
/// it is applied and the remainder decays, which gives the gliding stop of
/// classic orbit controls.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub damping_factor: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pending: OrbitDelta,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
struct OrbitDelta {
    yaw: f32,
    pitch: f32,
    /// Multiplicative zoom, `1` means none
    zoom: f32,
    pan: Vec3,
}

impl OrbitCamera {
    /// Orbit state that reproduces a camera at `eye` looking at `target`
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(f32::EPSILON);
        Self {
            target,
            radius,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / radius).clamp(-1.0, 1.0).asin(),
            damping_factor: 0.05,
            min_radius: 2.0,
            max_radius: 450.0,
            pending: OrbitDelta {
                zoom: 1.0,
                ..default()
            },
        }
    }

    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.pending.yaw += yaw;
        self.pending.pitch += pitch;
    }

    pub fn zoom(&mut self, scale: f32) {
        self.pending.zoom *= scale;
    }

    pub fn pan(&mut self, offset: Vec3) {
        self.pending.pan += offset;
    }

    /// Applies one frame's share of the pending input.
    pub fn step(&mut self) {
        let damping = self.damping_factor.clamp(f32::EPSILON, 1.0);

        self.yaw += self.pending.yaw * damping;
        self.pitch = (self.pitch + self.pending.pitch * damping).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.radius = (self.radius * self.pending.zoom.powf(damping))
            .clamp(self.min_radius, self.max_radius);
        self.target += self.pending.pan * damping;

        let keep = 1.0 - damping;
        self.pending.yaw *= keep;
        self.pending.pitch *= keep;
        self.pending.zoom = self.pending.zoom.powf(keep);
        self.pending.pan *= keep;
    }

    pub fn eye(&self) -> Vec3 {
        let horizontal = self.radius * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.radius * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, (orbit_input, apply_orbit).chain());
}

fn orbit_input(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut cameras: Query<(&mut OrbitCamera, &Transform)>,
) {
    let motion = mouse_motion.delta;
    let scroll = match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y / PIXELS_PER_LINE,
    };

    for (mut orbit, transform) in &mut cameras {
        if mouse_buttons.pressed(MouseButton::Left) && motion != Vec2::ZERO {
            orbit.rotate(-motion.x * ROTATE_SENSITIVITY, motion.y * ROTATE_SENSITIVITY);
        }
        if mouse_buttons.pressed(MouseButton::Right) && motion != Vec2::ZERO {
            let scale = orbit.radius * PAN_SENSITIVITY;
            let offset = (transform.left() * motion.x + transform.up() * motion.y) * scale;
            orbit.pan(offset);
        }
        if scroll != 0.0 {
            orbit.zoom(ZOOM_STEP.powf(scroll));
        }
    }
}

fn apply_orbit(mut cameras: Query<(&mut OrbitCamera, &mut Transform)>) {
    for (mut orbit, mut transform) in &mut cameras {
        orbit.step();
        *transform = orbit.transform();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_looking_at_reproduces_eye() {
        let eye = Vec3::new(0.0, 20.0, 30.0);
        let orbit = OrbitCamera::looking_at(eye, Vec3::ZERO);
        let rebuilt = orbit.eye();
        assert_relative_eq!(rebuilt.x, eye.x, epsilon = 1e-3);
        assert_relative_eq!(rebuilt.y, eye.y, epsilon = 1e-3);
        assert_relative_eq!(rebuilt.z, eye.z, epsilon = 1e-3);
    }

    #[test]
    fn test_damped_rotation_converges() {
        let mut orbit = OrbitCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        orbit.rotate(1.0, 0.0);

        orbit.step();
        assert_relative_eq!(orbit.yaw, 0.05, epsilon = 1e-5);

        for _ in 0..500 {
            orbit.step();
        }
        assert_relative_eq!(orbit.yaw, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut orbit = OrbitCamera::looking_at(Vec3::new(0.0, 20.0, 30.0), Vec3::ZERO);
        orbit.rotate(0.0, 100.0);
        for _ in 0..200 {
            orbit.step();
        }
        assert!(orbit.pitch <= PITCH_LIMIT);
    }

    #[test]
    fn test_zoom_respects_radius_limits() {
        let mut orbit = OrbitCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        orbit.zoom(1e-6);
        for _ in 0..500 {
            orbit.step();
        }
        assert!(orbit.radius >= orbit.min_radius);
    }
}
