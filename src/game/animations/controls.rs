use bevy::{
    input::{
        ButtonState,
        keyboard::{Key, KeyboardInput},
    },
    prelude::*,
};
use bevy_hotpatching_experiments::hot;

use super::{
    animation_controller::{AnimationController, KeyResponse},
    models::{ActorId, Creature},
};

/// Lowercase token for a logical key, `None` for keys the demo doesn't care about
pub fn key_token(key: &Key) -> Option<String> {
    let token = match key {
        Key::Character(text) => text.to_lowercase(),
        Key::Shift => "shift".into(),
        Key::Space => "space".into(),
        Key::ArrowUp => "arrowup".into(),
        Key::ArrowDown => "arrowdown".into(),
        Key::ArrowLeft => "arrowleft".into(),
        Key::ArrowRight => "arrowright".into(),
        _ => return None,
    };
    Some(token)
}

/// Forwards key presses and releases to every creature's animator
#[hot]
pub fn forward_key_events(
    mut keyboard_events: MessageReader<KeyboardInput>,
    creatures: Query<(Entity, &Creature)>,
    mut controller: ResMut<AnimationController>,
) {
    for event in keyboard_events.read() {
        let Some(token) = key_token(&event.logical_key) else {
            continue;
        };

        for (entity, creature) in &creatures {
            let actor = ActorId::from(entity);
            let response = match event.state {
                ButtonState::Pressed => controller.on_key_down(actor, &token),
                ButtonState::Released => controller.on_key_up(actor, &token),
            };
            match response {
                Ok(KeyResponse::Transitioned(phase)) => {
                    debug!("{} {phase} on `{token}`", creature.kind.label());
                }
                Ok(KeyResponse::Ignored) => {}
                Err(err) => warn!("{}: {err}", creature.kind.label()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characters_are_lowercased() {
        assert_eq!(key_token(&Key::Character("W".into())), Some("w".to_string()));
        assert_eq!(key_token(&Key::Character("w".into())), Some("w".to_string()));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(key_token(&Key::Shift), Some("shift".to_string()));
        assert_eq!(key_token(&Key::ArrowUp), Some("arrowup".to_string()));
        assert_eq!(key_token(&Key::Escape), None);
    }
}
