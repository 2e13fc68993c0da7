//! A drive session: the current world, the chase camera and the fixed-step clock that ties them
//! together.
//!
//! Frames of arbitrary length are converted into fixed physics ticks through an accumulator, so
//! the simulation does not depend on the frame rate. Regeneration builds a complete new [`World`]
//! before swapping it in.

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use super::{
    BiomeKind, CameraConfig, CenterlinePoint, ChaseCamera, DriveInput, EndlessRoad, Feature,
    GenerationMode, InputSnapshot, LoopConfig, LoopTrack, ObstacleField, PathError, PathGenerator,
    RoadConfig, Vehicle, VehicleError, VehicleParams,
};

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub mode: GenerationMode,
    /// Biome of every world. A random biome is picked per world if unset.
    pub biome: Option<BiomeKind>,
    pub road: RoadConfig,
    pub looped: LoopConfig,
    pub vehicle: VehicleParams,
    pub camera: CameraConfig,
    /// Longest frame fed into the accumulator, in seconds.
    pub max_frame_dt: f64,
    /// The endless road is extended while the car is closer than this to its last point.
    pub frontier_distance: f64,
    /// Points requested per extension.
    pub frontier_batch: usize,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        self.road.validate()?;
        self.looped.validate()?;
        self.vehicle.validate()?;
        self.camera.validate()?;
        if !(self.max_frame_dt > 0.0) {
            return Err(SessionError::InvalidFrameClamp(self.max_frame_dt));
        }
        if !(self.frontier_distance >= 0.0) {
            return Err(SessionError::InvalidFrontierDistance(self.frontier_distance));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            biome: None,
            road: RoadConfig::default(),
            looped: LoopConfig::default(),
            vehicle: VehicleParams::default(),
            camera: CameraConfig::default(),
            max_frame_dt: 0.05,
            frontier_distance: 200.0,
            frontier_batch: 30,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("invalid path configuration: {0}")]
    Path(#[from] PathError),
    #[error("invalid vehicle configuration: {0}")]
    Vehicle(#[from] VehicleError),
    #[error("camera stiffness must be positive, got {0}")]
    InvalidCameraStiffness(f64),
    #[error("camera offsets must not be negative, got {0}")]
    NegativeCameraOffset(f64),
    #[error("frame clamp must be positive, got {0}")]
    InvalidFrameClamp(f64),
    #[error("frontier distance must not be negative, got {0}")]
    InvalidFrontierDistance(f64),
}

/// Everything that is replaced on regeneration.
pub struct World {
    seed: u64,
    mode: GenerationMode,
    biome: BiomeKind,
    features: Vec<Feature>,
    obstacles: ObstacleField,
    path: Box<dyn PathGenerator>,
    vehicle: Vehicle,
}

impl World {
    /// Builds a world. Identical configuration, mode and seed yield identical worlds.
    pub fn generate(
        config: &SessionConfig,
        mode: GenerationMode,
        seed: u64,
    ) -> Result<Self, SessionError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let biome = config.biome.unwrap_or_else(|| BiomeKind::random(&mut rng));

        // The loop is not steered around anything, so it gets no scenery in its way.
        let features = match mode {
            GenerationMode::Endless => biome.populate(&mut rng),
            GenerationMode::Loop => vec![],
        };
        let path: Box<dyn PathGenerator> = match mode {
            GenerationMode::Endless => Box::new(EndlessRoad::new(
                RoadConfig {
                    avoid_margin: biome.avoid_radius(),
                    ..config.road.clone()
                },
                CenterlinePoint::default(),
                rng.random(),
            )?),
            GenerationMode::Loop => Box::new(LoopTrack::generate(&config.looped, seed)?),
        };
        let obstacles = ObstacleField::new(
            features
                .iter()
                .map(|feature| feature.exclusion_zone(biome.avoid_radius()))
                .collect(),
        );

        let mut world = Self {
            seed,
            mode,
            biome,
            features,
            obstacles,
            path,
            vehicle: Vehicle::new(config.vehicle.clone())?,
        };
        world
            .path
            .ensure_ahead(&world.obstacles, config.road.initial_points);
        if let Some(start) = world.path.first() {
            world.vehicle.place(&start);
        }

        info!(
            "generated {:?} world in {} with seed {seed}: {} obstacles, {} centerline points",
            mode,
            biome.label(),
            world.obstacles.len(),
            world.path.points().len()
        );
        Ok(world)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn biome(&self) -> BiomeKind {
        self.biome
    }

    pub fn road_width(&self) -> f64 {
        self.biome.road_width()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn path(&self) -> &dyn PathGenerator {
        self.path.as_ref()
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// One physics tick. Grows the road when the car nears its end.
    fn tick(&mut self, input: DriveInput, frontier_distance: f64, frontier_batch: usize) {
        self.vehicle.step(input);

        if self.path.is_closed() {
            return;
        }
        let Some(head) = self.path.last() else {
            return;
        };
        if self.vehicle.position().distance(head.position) < frontier_distance {
            let target = self.path.points().len() + frontier_batch;
            self.path.ensure_ahead(&self.obstacles, target);
        }
    }
}

pub struct Session {
    config: SessionConfig,
    world: World,
    camera: ChaseCamera,
    accumulator: f64,
    generation: u64,
}

impl Session {
    /// Starts a session in the configured mode. Without a seed a random one is drawn.
    pub fn new(config: SessionConfig, seed: Option<u64>) -> Result<Self, SessionError> {
        config.validate()?;
        let world = World::generate(&config, config.mode, seed.unwrap_or_else(random_seed))?;
        let camera = ChaseCamera::new(
            config.camera.clone(),
            world.vehicle.state(),
            world.vehicle.elevation(),
        );
        Ok(Self {
            config,
            world,
            camera,
            accumulator: 0.0,
            generation: 0,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &ChaseCamera {
        &self.camera
    }

    /// Incremented on every regeneration.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the world. The camera jumps to the new start instead of sweeping across the map.
    pub fn regenerate(
        &mut self,
        mode: GenerationMode,
        seed: Option<u64>,
    ) -> Result<(), SessionError> {
        let world = World::generate(&self.config, mode, seed.unwrap_or_else(random_seed))?;
        self.world = world;
        self.accumulator = 0.0;
        self.generation += 1;
        self.camera
            .snap_to(self.world.vehicle.state(), self.world.vehicle.elevation());
        Ok(())
    }

    /// Advances the session by one rendered frame of `dt` seconds and returns the number of
    /// physics ticks run.
    pub fn frame(&mut self, dt: f64, input: &InputSnapshot) -> Result<usize, SessionError> {
        if input.reset_requested {
            self.regenerate(self.world.mode, None)?;
        }

        let mut dt = dt.max(0.0);
        if dt > self.config.max_frame_dt {
            warn!(
                "frame took {dt:.3} s, simulating only {:.3} s",
                self.config.max_frame_dt
            );
            dt = self.config.max_frame_dt;
        }

        let drive = DriveInput::from(input);
        let fixed_dt = self.config.vehicle.fixed_dt;
        let mut ticks = 0;
        self.accumulator += dt;
        while self.accumulator >= fixed_dt {
            self.world.tick(
                drive,
                self.config.frontier_distance,
                self.config.frontier_batch,
            );
            self.accumulator -= fixed_dt;
            ticks += 1;
        }

        self.camera.update(
            self.world.vehicle.state(),
            self.world.vehicle.elevation(),
            dt,
        );
        Ok(ticks)
    }
}

fn random_seed() -> u64 {
    rand::rng().random()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    /// Binary fractions keep the accumulator exact.
    fn config(mode: GenerationMode) -> SessionConfig {
        SessionConfig {
            mode,
            biome: Some(BiomeKind::Forest),
            vehicle: VehicleParams {
                fixed_dt: 0.25,
                ..VehicleParams::default()
            },
            max_frame_dt: 1.0,
            ..SessionConfig::default()
        }
    }

    fn forward() -> InputSnapshot {
        InputSnapshot {
            forward: true,
            ..InputSnapshot::default()
        }
    }

    #[test]
    fn test_session_accumulates_fixed_ticks() {
        let mut session = Session::new(config(GenerationMode::Endless), Some(1)).unwrap();
        let ticks = [0.375, 0.5, 0.375, 0.125]
            .iter()
            .map(|dt| session.frame(*dt, &forward()).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ticks, vec![1, 2, 2, 0]);
    }

    #[test]
    fn test_session_clamps_long_frames() {
        let mut session = Session::new(config(GenerationMode::Endless), Some(1)).unwrap();
        assert_eq!(session.frame(10.0, &forward()).unwrap(), 4);
        assert_eq!(session.frame(-1.0, &forward()).unwrap(), 0);
    }

    #[test]
    fn test_session_starts_on_first_point() {
        let session = Session::new(config(GenerationMode::Loop), Some(3)).unwrap();
        let world = session.world();
        let start = world.path().first().unwrap();
        assert_eq!(world.vehicle().position(), start.position);
        assert_eq!(world.vehicle().yaw(), start.heading);
        assert_eq!(world.vehicle().speed(), 0.0);
    }

    #[test]
    fn test_session_endless_world() {
        let session = Session::new(config(GenerationMode::Endless), Some(5)).unwrap();
        let world = session.world();
        assert_eq!(world.mode(), GenerationMode::Endless);
        assert_eq!(world.biome(), BiomeKind::Forest);
        assert_eq!(world.path().points().len(), RoadConfig::default().initial_points);
        assert!(!world.path().is_closed());
        assert_eq!(world.obstacles().len(), world.features().len());
        assert!(!world.features().is_empty());
    }

    #[test]
    fn test_session_loop_world_is_reproducible() {
        let mut session = Session::new(config(GenerationMode::Loop), Some(42)).unwrap();
        let first = session.world().path().points().to_vec();
        session.regenerate(GenerationMode::Loop, Some(7)).unwrap();
        assert_ne!(session.world().path().points(), first.as_slice());
        session.regenerate(GenerationMode::Loop, Some(42)).unwrap();
        assert_eq!(session.world().path().points(), first.as_slice());
        assert_eq!(session.world().seed(), 42);
        assert_eq!(session.generation(), 2);
    }

    #[rstest]
    #[case(GenerationMode::Endless)]
    #[case(GenerationMode::Loop)]
    fn test_session_same_seed_same_world(#[case] mode: GenerationMode) {
        let a = World::generate(&config(mode), mode, 11).unwrap();
        let b = World::generate(&config(mode), mode, 11).unwrap();
        assert_eq!(a.path().points(), b.path().points());
        assert_eq!(a.features(), b.features());
    }

    #[test]
    fn test_session_extends_road_near_frontier() {
        let mut session = Session::new(
            SessionConfig {
                frontier_distance: 400.0,
                ..config(GenerationMode::Endless)
            },
            Some(2),
        )
        .unwrap();
        let before = session.world().path().points().len();
        session.frame(0.25, &InputSnapshot::default()).unwrap();
        assert_eq!(session.world().path().points().len(), before + 30);
    }

    #[test]
    fn test_session_reset_returns_car_to_start() {
        let mut session = Session::new(config(GenerationMode::Loop), Some(9)).unwrap();
        for _ in 0..8 {
            session.frame(0.25, &forward()).unwrap();
        }
        assert!(session.world().vehicle().speed() > 1.0);

        let reset = InputSnapshot {
            reset_requested: true,
            ..InputSnapshot::default()
        };
        session.frame(0.0, &reset).unwrap();
        let world = session.world();
        assert_eq!(session.generation(), 1);
        assert_eq!(world.mode(), GenerationMode::Loop);
        assert_eq!(world.vehicle().speed(), 0.0);
        assert_eq!(
            world.vehicle().position(),
            world.path().first().unwrap().position
        );
    }

    #[test]
    fn test_session_camera_snaps_on_regenerate() {
        let mut session = Session::new(config(GenerationMode::Endless), Some(4)).unwrap();
        for _ in 0..8 {
            session.frame(0.25, &forward()).unwrap();
        }
        session.regenerate(GenerationMode::Endless, Some(4)).unwrap();
        let camera = session.camera();
        let vehicle = session.world().vehicle();
        let expected = camera.config().height + vehicle.elevation();
        assert_abs_diff_eq!(camera.position().y, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(
            (camera.target() - camera.position()).xz().norm(),
            camera.config().distance + camera.config().look_ahead,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_session_config_rejected() {
        let error = Session::new(
            SessionConfig {
                looped: LoopConfig {
                    control_points: 1,
                    ..LoopConfig::default()
                },
                ..SessionConfig::default()
            },
            Some(0),
        )
        .err()
        .unwrap();
        assert_snapshot!(
            error.to_string(),
            @"invalid path configuration: a loop needs at least 3 control points, got 1"
        );
    }
}
