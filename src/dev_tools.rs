//! Development tools for the game. This plugin is only enabled in dev builds.

use std::fmt::Write as _;

use bevy::{
    dev_tools::states::log_transitions, input::common_conditions::input_just_pressed, prelude::*,
};

use crate::{
    game::{AnimationController, Creature},
    screens::Screen,
};

pub(super) fn plugin(app: &mut App) {
    // Log `Screen` state transitions.
    app.add_systems(Update, log_transitions::<Screen>);

    // Toggle the debug overlay for UI.
    app.add_systems(
        Update,
        toggle_debug_ui.run_if(input_just_pressed(TOGGLE_KEY)),
    );

    app.add_systems(Startup, spawn_animation_overlay);
    app.add_systems(
        Update,
        (
            toggle_animation_overlay.run_if(input_just_pressed(OVERLAY_KEY)),
            update_animation_overlay,
        )
            .chain(),
    );
}

const TOGGLE_KEY: KeyCode = KeyCode::Backquote;
const OVERLAY_KEY: KeyCode = KeyCode::F3;

fn toggle_debug_ui(mut options: ResMut<UiDebugOptions>) {
    options.toggle();
}

/// Text panel listing every creature's animation phase and clip weights
#[derive(Component)]
struct AnimationOverlay;

fn spawn_animation_overlay(mut commands: Commands) {
    commands.spawn((
        Name::new("Animation Overlay"),
        AnimationOverlay,
        Node {
            position_type: PositionType::Absolute,
            top: px(10),
            left: px(10),
            ..default()
        },
        Text::new(""),
        TextFont::from_font_size(14.0),
        TextColor(Color::WHITE),
        Visibility::Hidden,
    ));
}

fn toggle_animation_overlay(mut overlay: Query<&mut Visibility, With<AnimationOverlay>>) {
    for mut visibility in &mut overlay {
        visibility.toggle_visible_hidden();
        info!("Animation overlay: {}", if *visibility == Visibility::Hidden { "OFF" } else { "ON" });
    }
}

fn update_animation_overlay(
    controller: Res<AnimationController>,
    creatures: Query<(Entity, &Creature)>,
    mut overlay: Query<(&mut Text, &Visibility), With<AnimationOverlay>>,
) {
    let Ok((mut text, visibility)) = overlay.single_mut() else {
        return;
    };
    if *visibility == Visibility::Hidden {
        return;
    }

    let mut report = String::new();
    for (entity, creature) in &creatures {
        let Some(animator) = controller.animator(entity.into()) else {
            continue;
        };
        let state = animator.state();
        let _ = writeln!(
            report,
            "{} [{:?}]: {} (current {}, previous {})",
            creature.kind.label(),
            animator.profile().transition_style,
            animator.phase(),
            state.current().unwrap_or("-"),
            state.previous().unwrap_or("-"),
        );
        let mut clips: Vec<_> = animator.clips().collect();
        clips.sort_by(|a, b| a.name().cmp(b.name()));
        for clip in clips {
            let _ = writeln!(
                report,
                "    {:<12} w={:.2} t={:.2}/{:.2}",
                clip.name(),
                clip.effective_weight(),
                clip.time(),
                clip.duration()
            );
        }
    }
    text.0 = report;
}
