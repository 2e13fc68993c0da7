//! Keyboard controls.
//!
//! WASD or the arrow keys drive, Shift drifts, R regenerates the world and M switches between the
//! endless road and the closed loop.

use bevy::{input::InputSystem, prelude::*};

use crate::{
    domain::InputSnapshot,
    resource::{InputRes, SessionRes},
};

pub struct Controller;

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputRes>()
            .add_systems(PreUpdate, (control, switch_mode).after(InputSystem));
    }
}

fn control(keys: Res<ButtonInput<KeyCode>>, mut input: ResMut<InputRes>) {
    let pressed = |codes: &[KeyCode]| keys.any_pressed(codes.iter().copied());

    *input = InputSnapshot {
        forward: pressed(&[KeyCode::KeyW, KeyCode::ArrowUp]),
        backward: pressed(&[KeyCode::KeyS, KeyCode::ArrowDown]),
        left: pressed(&[KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: pressed(&[KeyCode::KeyD, KeyCode::ArrowRight]),
        drift: pressed(&[KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        reset_requested: keys.just_pressed(KeyCode::KeyR),
    }
    .into();
}

fn switch_mode(keys: Res<ButtonInput<KeyCode>>, mut session: ResMut<SessionRes>) {
    if !keys.just_pressed(KeyCode::KeyM) {
        return;
    }
    let mode = session.world().mode().toggled();
    if let Err(error) = session.regenerate(mode, None) {
        error!("failed to switch to {mode:?}: {error}");
    }
}
