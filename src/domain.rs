//! The domain module encapsulates the core driving logic: procedurally generated roads, the
//! obstacles they avoid, the car's dynamics and the camera following it.
//!
//! By minimizing hard dependencies, this module ensures the simulation remains independent of the
//! engine used to render it.

mod basis;
mod biome;
mod camera;
mod lcg;
mod noise;
mod obstacle;
mod path;
mod ribbon;
mod session;
pub(crate) mod spline;
mod vehicle;

pub use basis::{Angle, Position};
pub use biome::{BiomeKind, Feature, FeatureKind};
pub use camera::{CameraConfig, ChaseCamera};
pub use lcg::Lcg;
pub use noise::{NoiseConfig, SmoothedNoise};
pub use obstacle::{Obstacle, ObstacleField};
pub use path::{
    CenterlinePoint, EndlessRoad, GenerationMode, LoopConfig, LoopTrack, PathError,
    PathGenerator, RoadConfig,
};
pub use ribbon::{road_indices, road_row, road_rows, RoadRow};
pub use session::{Session, SessionConfig, SessionError, World};
pub use vehicle::{
    DriveInput, InputSnapshot, Vehicle, VehicleError, VehicleParams, VehicleState,
};
