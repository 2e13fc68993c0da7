//! Simulation of the car on the generated road.
//!
//! Every frame the elapsed time and the current input are handed to the session, which runs the
//! fixed-step physics, extends the road ahead of the car and moves the chase camera.

use bevy::prelude::*;

use crate::resource::{InputRes, SessionRes};

pub struct Simulator;

/// Systems advancing the session. Everything reading its state runs afterwards.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Simulation;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, simulate.in_set(Simulation));
    }
}

fn simulate(time: Res<Time>, input: Res<InputRes>, mut session: ResMut<SessionRes>) {
    if let Err(error) = session.frame(time.delta_seconds_f64(), &input) {
        error!("simulation step failed: {error}");
    }
}
