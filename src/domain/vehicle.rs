//! Car driven by a fixed-timestep bicycle model with reduced lateral grip while drifting.
//!
//! The velocity is split into a longitudinal part along the car's heading and a lateral part
//! across it. The longitudinal part is driven by engine, brake, air drag and rolling resistance;
//! the lateral part decays towards zero at a rate given by the cornering stiffness. The yaw rate
//! follows from the longitudinal speed and the steering angle.

use nalgebra::Vector2;
use thiserror::Error;

use super::{Angle, CenterlinePoint, Position};

/// Factor converting meters per second into kilometers per hour.
const KMH_PER_MPS: f64 = 3.6;

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleParams {
    pub engine_acceleration: f64,
    pub brake_deceleration: f64,
    pub air_drag: f64,
    /// Scale applied to the quadratic air drag term.
    pub drag_scale: f64,
    pub rolling_resistance: f64,
    pub cornering_stiffness: f64,
    pub cornering_stiffness_drift: f64,
    /// Rate at which the steering angle follows the steering input.
    pub steer_speed: f64,
    pub max_steer: f64,
    pub wheel_base: f64,
    pub max_speed: f64,
    pub ground_clearance: f64,
    pub fixed_dt: f64,
}

impl VehicleParams {
    pub fn validate(&self) -> Result<(), VehicleError> {
        for (name, value) in [
            ("wheel base", self.wheel_base),
            ("fixed time step", self.fixed_dt),
            ("maximum speed", self.max_speed),
            ("maximum steering angle", self.max_steer),
            ("steering speed", self.steer_speed),
        ] {
            if !(value > 0.0) {
                return Err(VehicleError::NotPositive { name, value });
            }
        }
        for (name, value) in [
            ("engine acceleration", self.engine_acceleration),
            ("brake deceleration", self.brake_deceleration),
            ("air drag", self.air_drag),
            ("drag scale", self.drag_scale),
            ("rolling resistance", self.rolling_resistance),
            ("cornering stiffness", self.cornering_stiffness),
            ("drift cornering stiffness", self.cornering_stiffness_drift),
        ] {
            if !(value >= 0.0) {
                return Err(VehicleError::Negative { name, value });
            }
        }
        Ok(())
    }

    fn drag(&self) -> f64 {
        self.air_drag * self.drag_scale
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            engine_acceleration: 30.0,
            brake_deceleration: 55.0,
            air_drag: 0.75,
            drag_scale: 0.002,
            rolling_resistance: 2.0,
            cornering_stiffness: 22.0,
            cornering_stiffness_drift: 6.0,
            steer_speed: 4.5,
            max_steer: 0.6,
            wheel_base: 2.5,
            max_speed: 95.0,
            ground_clearance: 0.45,
            fixed_dt: 1.0 / 120.0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VehicleError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

/// Player controls as sampled once per frame.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub drift: bool,
    pub reset_requested: bool,
}

/// Controls as seen by the physics step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriveInput {
    pub throttle: f64,
    pub brake: f64,
    /// Steering in `[-1, 1]`, positive turns towards increasing yaw.
    pub steer: f64,
    pub drift: bool,
}

impl From<&InputSnapshot> for DriveInput {
    fn from(input: &InputSnapshot) -> Self {
        let axis = |on: bool| if on { 1.0 } else { 0.0 };
        Self {
            throttle: axis(input.forward),
            brake: axis(input.backward),
            steer: axis(input.right) - axis(input.left),
            drift: input.drift,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleState {
    pub position: Position,
    pub velocity: Vector2<f64>,
    pub yaw: Angle,
    pub steer_angle: f64,
}

impl VehicleState {
    /// Unit vector along the car's heading.
    pub fn forward(&self) -> Vector2<f64> {
        let yaw = self.yaw.radians();
        Vector2::new(yaw.cos(), yaw.sin())
    }

    /// Unit vector to the car's right.
    pub fn right(&self) -> Vector2<f64> {
        let yaw = self.yaw.radians();
        Vector2::new(-yaw.sin(), yaw.cos())
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    pub fn forward_speed(&self) -> f64 {
        self.forward().dot(&self.velocity)
    }

    pub fn lateral_speed(&self) -> f64 {
        self.right().dot(&self.velocity)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    params: VehicleParams,
    state: VehicleState,
}

impl Vehicle {
    pub fn new(params: VehicleParams) -> Result<Self, VehicleError> {
        params.validate()?;
        Ok(Self {
            params,
            state: VehicleState::default(),
        })
    }

    /// Vehicle at rest on `start`, facing along the road.
    pub fn at(params: VehicleParams, start: &CenterlinePoint) -> Result<Self, VehicleError> {
        let mut vehicle = Self::new(params)?;
        vehicle.place(start);
        Ok(vehicle)
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn yaw(&self) -> Angle {
        self.state.yaw
    }

    pub fn speed(&self) -> f64 {
        self.state.speed()
    }

    pub fn speed_kmh(&self) -> f64 {
        (self.speed() * KMH_PER_MPS).round()
    }

    /// Height of the body above the ground plane.
    pub fn elevation(&self) -> f64 {
        self.params.ground_clearance
    }

    pub fn place(&mut self, start: &CenterlinePoint) {
        self.state = VehicleState {
            position: start.position,
            yaw: start.heading,
            ..VehicleState::default()
        };
    }

    /// Advances the car by one fixed time step.
    pub fn step(&mut self, input: DriveInput) {
        let p = &self.params;
        let dt = p.fixed_dt;
        let throttle = input.throttle.clamp(0.0, 1.0);
        let brake = input.brake.clamp(0.0, 1.0);

        let target_steer = input.steer.clamp(-1.0, 1.0) * p.max_steer;
        let state = &mut self.state;
        state.steer_angle += (target_steer - state.steer_angle) * (1.0 - (-dt * p.steer_speed).exp());

        let forward = state.forward();
        let right = state.right();
        let v_long = forward.dot(&state.velocity);
        let v_lat = right.dot(&state.velocity);

        let a_long = throttle * p.engine_acceleration
            - sign(v_long) * brake * p.brake_deceleration
            - p.drag() * v_long * v_long.abs()
            - p.rolling_resistance * sign(v_long);
        let stiffness = if input.drift {
            p.cornering_stiffness_drift
        } else {
            p.cornering_stiffness
        };
        let a_lat = -stiffness * v_lat;

        let mut new_v_long = v_long + a_long * dt;
        // Resistances stop the car but never push it backwards.
        if throttle == 0.0 && sign(new_v_long) * sign(v_long) < 0.0 {
            new_v_long = 0.0;
        }
        let new_v_lat = v_lat + a_lat * dt;

        state.velocity = forward * new_v_long + right * new_v_lat;
        let speed = state.velocity.norm();
        if speed > p.max_speed {
            state.velocity *= p.max_speed / speed;
        }

        let yaw_rate = new_v_long / p.wheel_base * state.steer_angle.tan();
        state.yaw = state.yaw + yaw_rate * dt;
        state.position = state.position
            + Position::new(state.velocity.x * dt, state.velocity.y * dt);
    }
}

/// Sign of `value`, zero for zero.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    use super::*;

    const TWO_SECONDS: usize = 240;

    fn throttle() -> DriveInput {
        DriveInput {
            throttle: 1.0,
            ..DriveInput::default()
        }
    }

    fn brake() -> DriveInput {
        DriveInput {
            brake: 1.0,
            ..DriveInput::default()
        }
    }

    fn vehicle(params: VehicleParams) -> Vehicle {
        Vehicle::new(params).unwrap()
    }

    #[test]
    fn test_vehicle_throttle_converges_to_equilibrium() {
        // 30 - 0.07 v^2 - 2 = 0 at v = 20.
        let mut car = vehicle(VehicleParams {
            air_drag: 35.0,
            ..VehicleParams::default()
        });
        let mut previous = 0.0;
        for _ in 0..TWO_SECONDS {
            car.step(throttle());
            let speed = car.state().forward_speed();
            assert!(speed >= previous);
            previous = speed;
        }
        assert_abs_diff_eq!(previous, 20.0, epsilon = 0.25);
        assert!(previous < car.params().max_speed);
    }

    #[test]
    fn test_vehicle_throttle_follows_analytic_solution() {
        // dv/dt = a - c v^2 integrates to v(t) = sqrt(a / c) * tanh(t * sqrt(a * c)).
        let params = VehicleParams::default();
        let a = params.engine_acceleration - params.rolling_resistance;
        let c = params.air_drag * params.drag_scale;
        let expected = (a / c).sqrt() * (2.0 * (a * c).sqrt()).tanh();

        let mut car = vehicle(params);
        for _ in 0..TWO_SECONDS {
            car.step(throttle());
        }
        assert_abs_diff_eq!(car.speed(), expected, epsilon = 0.2);
        assert!(car.speed() < car.params().max_speed);
    }

    #[test]
    fn test_vehicle_brake_stops_without_reversing() {
        let mut car = vehicle(VehicleParams::default());
        car.state.velocity = Vector2::new(20.0, 0.0);

        let mut previous = car.state().forward_speed();
        for _ in 0..TWO_SECONDS {
            car.step(brake());
            let speed = car.state().forward_speed();
            assert!(speed <= previous);
            assert!(speed >= -1e-9);
            previous = speed;
        }
        assert_abs_diff_eq!(previous, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(car.speed(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_vehicle_coasting_comes_to_rest() {
        let mut car = vehicle(VehicleParams::default());
        car.state.velocity = Vector2::new(1.0, 0.0);
        for _ in 0..TWO_SECONDS {
            car.step(DriveInput::default());
        }
        assert_eq!(car.state().forward_speed(), 0.0);
    }

    #[test]
    fn test_vehicle_speed_never_exceeds_maximum() {
        let mut car = vehicle(VehicleParams::default());
        for _ in 0..120 * 60 {
            car.step(throttle());
            assert!(car.speed() <= car.params().max_speed + 1e-9);
        }
        assert_abs_diff_eq!(car.speed(), car.params().max_speed, epsilon = 1e-6);
    }

    #[rstest]
    #[case::grip(false)]
    #[case::drift(true)]
    fn test_vehicle_bounds_hold_for_random_input(#[case] drift: bool) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut car = vehicle(VehicleParams::default());
        let max_steer = car.params().max_steer;
        for _ in 0..120 * 30 {
            let input = DriveInput {
                throttle: if rng.random_bool(0.7) { 1.0 } else { 0.0 },
                brake: if rng.random_bool(0.2) { 1.0 } else { 0.0 },
                steer: rng.random_range(-1.0..=1.0),
                drift,
            };
            let yaw = car.yaw();
            let steer = car.state().steer_angle;
            car.step(input);
            assert!(car.speed() <= car.params().max_speed + 1e-9);
            assert!(car.state().steer_angle.abs() <= max_steer + 1e-12);
            // Continuous input yields small per-tick changes.
            assert!((car.state().steer_angle - steer).abs() < 0.05);
            assert!((car.yaw().radians() - yaw.radians()).abs() < 0.5);
        }
    }

    #[test]
    fn test_vehicle_steers_towards_increasing_yaw() {
        let mut car = vehicle(VehicleParams::default());
        car.state.velocity = Vector2::new(15.0, 0.0);
        for _ in 0..60 {
            car.step(DriveInput {
                steer: 1.0,
                ..throttle()
            });
        }
        assert!(car.yaw().radians() > 0.0);
        assert!(car.state().steer_angle > 0.0);
    }

    #[test]
    fn test_vehicle_drift_keeps_more_lateral_speed() {
        let slide = |drift: bool| {
            let mut car = vehicle(VehicleParams::default());
            car.state.velocity = Vector2::new(20.0, 10.0);
            for _ in 0..30 {
                car.step(DriveInput {
                    drift,
                    ..DriveInput::default()
                });
            }
            car.state().lateral_speed().abs()
        };
        assert!(slide(true) > slide(false));
    }

    #[test]
    fn test_vehicle_place_resets_state() {
        let mut car = vehicle(VehicleParams::default());
        for _ in 0..100 {
            car.step(throttle());
        }
        car.place(&CenterlinePoint::new(Position::new(3.0, 4.0), Angle::new(0.5 * PI)));
        assert_eq!(car.position(), Position::new(3.0, 4.0));
        assert_eq!(car.speed(), 0.0);
        assert_eq!(car.state().steer_angle, 0.0);
        assert_abs_diff_eq!(car.state().forward(), Vector2::new(0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_input_snapshot_to_drive_input() {
        let input = InputSnapshot {
            forward: true,
            left: true,
            right: true,
            drift: true,
            ..InputSnapshot::default()
        };
        assert_eq!(
            DriveInput::from(&input),
            DriveInput {
                throttle: 1.0,
                brake: 0.0,
                steer: 0.0,
                drift: true,
            }
        );
        let input = InputSnapshot {
            left: true,
            ..InputSnapshot::default()
        };
        assert_eq!(DriveInput::from(&input).steer, -1.0);
    }

    #[test]
    fn test_vehicle_speed_kmh() {
        let mut car = vehicle(VehicleParams::default());
        car.state.velocity = Vector2::new(10.0, 0.0);
        assert_eq!(car.speed_kmh(), 36.0);
    }

    #[rstest]
    #[case::wheel_base(VehicleParams { wheel_base: 0.0, ..VehicleParams::default() })]
    #[case::fixed_dt(VehicleParams { fixed_dt: -1.0, ..VehicleParams::default() })]
    #[case::drag(VehicleParams { air_drag: -0.1, ..VehicleParams::default() })]
    #[case::nan(VehicleParams { max_speed: f64::NAN, ..VehicleParams::default() })]
    fn test_vehicle_params_rejected(#[case] params: VehicleParams) {
        assert!(Vehicle::new(params).is_err());
    }

    #[test]
    fn test_vehicle_error_message() {
        let error = VehicleParams {
            wheel_base: 0.0,
            ..VehicleParams::default()
        }
        .validate()
        .unwrap_err();
        assert_snapshot!(error.to_string(), @"wheel base must be positive, got 0");
    }
}
