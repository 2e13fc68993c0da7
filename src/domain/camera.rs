//! Follow camera that trails the car along its direction of travel.

use nalgebra::{Point3, Vector2, Vector3};

use super::{SessionError, VehicleState};

/// Lateral speed to roll conversion before the configured roll factor is applied.
const ROLL_PER_LATERAL_SPEED: f64 = 0.0025;

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub height: f64,
    pub distance: f64,
    /// Rate of the exponential approach towards the desired position.
    pub stiffness: f64,
    /// Distance of the look-at target ahead of the car.
    pub look_ahead: f64,
    pub roll_factor: f64,
    pub max_roll: f64,
    /// Below this speed the car's heading is used as the direction of travel.
    pub min_speed: f64,
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(self.stiffness > 0.0) {
            return Err(SessionError::InvalidCameraStiffness(self.stiffness));
        }
        for value in [
            self.height,
            self.distance,
            self.look_ahead,
            self.max_roll,
            self.min_speed,
        ] {
            if !(value >= 0.0) {
                return Err(SessionError::NegativeCameraOffset(value));
            }
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            height: 6.5,
            distance: 12.0,
            stiffness: 6.0,
            look_ahead: 6.0,
            roll_factor: 0.15,
            max_roll: 0.08,
            min_speed: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChaseCamera {
    config: CameraConfig,
    position: Point3<f64>,
    target: Point3<f64>,
    roll: f64,
}

impl ChaseCamera {
    pub fn new(config: CameraConfig, vehicle: &VehicleState, elevation: f64) -> Self {
        let mut camera = Self {
            config,
            position: Point3::origin(),
            target: Point3::origin(),
            roll: 0.0,
        };
        camera.snap_to(vehicle, elevation);
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Camera position, y up.
    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    pub fn target(&self) -> Point3<f64> {
        self.target
    }

    /// Rotation around the viewing axis in radians.
    pub fn roll(&self) -> f64 {
        self.roll
    }

    /// Moves the camera straight to its resting pose behind the car.
    pub fn snap_to(&mut self, vehicle: &VehicleState, elevation: f64) {
        let direction = self.direction(vehicle);
        self.position = self.desired_position(vehicle, elevation, direction);
        self.target = self.look_at(vehicle, elevation, direction);
        self.roll = 0.0;
    }

    /// Eases the camera towards its pose behind the car. `dt` is the frame time.
    pub fn update(&mut self, vehicle: &VehicleState, elevation: f64, dt: f64) {
        let direction = self.direction(vehicle);
        let desired = self.desired_position(vehicle, elevation, direction);
        let blend = 1.0 - (-dt * self.config.stiffness).exp();
        self.position += (desired - self.position) * blend;
        self.target = self.look_at(vehicle, elevation, direction);

        // Leans into the car's sideways slip.
        self.roll = (vehicle.lateral_speed() * ROLL_PER_LATERAL_SPEED * self.config.roll_factor)
            .clamp(-self.config.max_roll, self.config.max_roll);
    }

    /// Direction of travel on the ground plane.
    fn direction(&self, vehicle: &VehicleState) -> Vector2<f64> {
        let speed = vehicle.speed();
        if speed < self.config.min_speed {
            vehicle.forward()
        } else {
            vehicle.velocity / speed
        }
    }

    fn desired_position(
        &self,
        vehicle: &VehicleState,
        elevation: f64,
        direction: Vector2<f64>,
    ) -> Point3<f64> {
        ground_point(vehicle, elevation) - lift(direction) * self.config.distance
            + Vector3::y() * self.config.height
    }

    fn look_at(
        &self,
        vehicle: &VehicleState,
        elevation: f64,
        direction: Vector2<f64>,
    ) -> Point3<f64> {
        ground_point(vehicle, elevation) + lift(direction) * self.config.look_ahead
    }
}

fn ground_point(vehicle: &VehicleState, elevation: f64) -> Point3<f64> {
    Point3::new(vehicle.position.x(), elevation, vehicle.position.z())
}

/// Ground plane direction in world space.
fn lift(direction: Vector2<f64>) -> Vector3<f64> {
    Vector3::new(direction.x, 0.0, direction.y)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::{Angle, Position};

    const ELEVATION: f64 = 0.45;

    fn state(yaw: f64, velocity: Vector2<f64>) -> VehicleState {
        VehicleState {
            position: Position::new(10.0, -5.0),
            velocity,
            yaw: Angle::new(yaw),
            steer_angle: 0.0,
        }
    }

    #[test]
    fn test_camera_snaps_behind_heading_at_rest() {
        let camera = ChaseCamera::new(
            CameraConfig::default(),
            &state(0.5 * PI, Vector2::zeros()),
            ELEVATION,
        );
        assert_abs_diff_eq!(
            camera.position(),
            Point3::new(10.0, ELEVATION + 6.5, -17.0),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            camera.target(),
            Point3::new(10.0, ELEVATION, 1.0),
            epsilon = 1e-9
        );
        assert_eq!(camera.roll(), 0.0);
    }

    #[test]
    fn test_camera_follows_velocity_not_heading() {
        let vehicle = state(0.0, Vector2::new(0.0, 20.0));
        let mut camera = ChaseCamera::new(CameraConfig::default(), &vehicle, ELEVATION);
        for _ in 0..600 {
            camera.update(&vehicle, ELEVATION, 1.0 / 60.0);
        }
        assert_abs_diff_eq!(
            camera.position(),
            Point3::new(10.0, ELEVATION + 6.5, -17.0),
            epsilon = 1e-6
        );
    }

    #[rstest]
    #[case(1.0 / 120.0)]
    #[case(1.0 / 30.0)]
    fn test_camera_approaches_monotonically(#[case] dt: f64) {
        let start = state(0.0, Vector2::zeros());
        let mut camera = ChaseCamera::new(CameraConfig::default(), &start, ELEVATION);
        let moved = VehicleState {
            position: Position::new(60.0, -5.0),
            ..start
        };
        let goal = Point3::new(48.0, ELEVATION + 6.5, -5.0);
        let mut previous = (camera.position() - goal).norm();
        for _ in 0..60 {
            camera.update(&moved, ELEVATION, dt);
            let distance = (camera.position() - goal).norm();
            assert!(distance < previous);
            previous = distance;
        }
    }

    #[rstest]
    #[case::right(Vector2::new(20.0, 40.0))]
    #[case::left(Vector2::new(20.0, -40.0))]
    fn test_camera_roll_is_bounded(#[case] velocity: Vector2<f64>) {
        let config = CameraConfig {
            roll_factor: 10.0,
            ..CameraConfig::default()
        };
        let vehicle = state(0.0, velocity);
        let mut camera = ChaseCamera::new(config, &vehicle, ELEVATION);
        camera.update(&vehicle, ELEVATION, 1.0 / 60.0);
        assert_abs_diff_eq!(camera.roll().abs(), 0.08, epsilon = 1e-12);
    }

    #[test]
    fn test_camera_no_roll_when_moving_straight() {
        let vehicle = state(1.0, Vector2::new(1.0_f64.cos(), 1.0_f64.sin()) * 30.0);
        let mut camera = ChaseCamera::new(CameraConfig::default(), &vehicle, ELEVATION);
        camera.update(&vehicle, ELEVATION, 1.0 / 60.0);
        assert_abs_diff_eq!(camera.roll(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_camera_config_rejects_stiffness() {
        let config = CameraConfig {
            stiffness: 0.0,
            ..CameraConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
