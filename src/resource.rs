//! The resource module encapsulates domain entities for use with Bevy.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;

use crate::domain;

#[derive(Resource)]
pub struct SessionRes(domain::Session);

impl Deref for SessionRes {
    type Target = domain::Session;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SessionRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::Session> for SessionRes {
    fn from(value: domain::Session) -> Self {
        Self(value)
    }
}

/// Player input of the current frame.
#[derive(Resource, Default)]
pub struct InputRes(domain::InputSnapshot);

impl Deref for InputRes {
    type Target = domain::InputSnapshot;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for InputRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::InputSnapshot> for InputRes {
    fn from(value: domain::InputSnapshot) -> Self {
        Self(value)
    }
}
