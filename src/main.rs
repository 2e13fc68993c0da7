use bevy::prelude::*;

mod controller;
mod domain;
mod resource;
mod simulator;
mod visualizer;

fn main() -> Result<(), domain::SessionError> {
    let session = domain::Session::new(domain::SessionConfig::default(), None)?;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Warm Drift".into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(resource::SessionRes::from(session))
        .add_plugins(controller::Controller)
        .add_plugins(visualizer::Visualizer)
        .add_plugins(simulator::Simulator)
        .run();

    Ok(())
}
