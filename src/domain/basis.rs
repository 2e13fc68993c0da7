//! Basic building blocks on the ground plane.

use std::{
    f64::consts::{PI, TAU},
    ops::{Add, Mul, Sub},
};

/// Point (or offset) on the ground plane. `z` is the second horizontal axis; height is never
/// stored here.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Position {
    x: f64,
    z: f64,
}

impl Position {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.z)
    }

    pub fn distance(&self, position: Self) -> f64 {
        (*self - position).length()
    }

    /// Moves `distance` along `heading`.
    pub fn advance(&self, heading: Angle, distance: f64) -> Position {
        *self + Position::from_heading(heading) * distance
    }

    /// Unit vector pointing along `heading`.
    pub fn from_heading(heading: Angle) -> Position {
        Position::new(heading.0.cos(), heading.0.sin())
    }

    /// Angle of the vector measured from the positive x-axis towards the positive z-axis.
    pub fn angle(&self) -> Angle {
        Angle(self.z.atan2(self.x))
    }

    pub fn lerp(&self, other: Position, t: f64) -> Position {
        *self + (other - *self) * t
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            z: self.z - rhs.z,
        }
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            z: self.z * rhs,
        }
    }
}

/// Heading in radians. Not normalised; use [`Angle::delta_to`] for signed differences.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn to_deg(self) -> f64 {
        (self.0 * (180.0 / PI) + 360.0) % 360.0
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Signed shortest rotation from `self` to `other`, in `(-PI, PI]`.
    pub fn delta_to(self, other: Angle) -> f64 {
        let delta = other.0 - self.0;
        delta.sin().atan2(delta.cos())
    }

    /// Equivalent angle in `[0, TAU)`.
    pub fn normalized(self) -> Angle {
        Angle(self.0.rem_euclid(TAU))
    }
}

impl Add<f64> for Angle {
    type Output = Angle;

    fn add(self, rhs: f64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

impl From<Angle> for f32 {
    fn from(value: Angle) -> Self {
        value.0 as f32
    }
}
