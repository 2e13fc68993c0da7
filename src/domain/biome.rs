//! Biomes and the obstacle-contributing features they scatter around the origin.

use std::f64::consts::TAU;

use rand::Rng;

use super::{Obstacle, Position};

/// Avoidance radius of a world relative to its road width.
const AVOID_RADIUS_PER_ROAD_WIDTH: f64 = 2.2;

const LAKE_RADIUS: (f64, f64) = (50.0, 110.0);
const LAKE_DISTANCE: (f64, f64) = (180.0, 600.0);
const CITY_BLOCK_SIZE: f64 = 50.0;
/// Share of a building's side length used as half extent of its exclusion zone.
const BUILDING_CLEARANCE_FACTOR: f64 = 0.7;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BiomeKind {
    Forest,
    Snow,
    Desert,
    Alpine,
    Coastal,
    City,
}

impl BiomeKind {
    pub const ALL: [BiomeKind; 6] = [
        BiomeKind::Forest,
        BiomeKind::Snow,
        BiomeKind::Desert,
        BiomeKind::Alpine,
        BiomeKind::Coastal,
        BiomeKind::City,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn label(self) -> &'static str {
        match self {
            BiomeKind::Forest => "Warm Forest",
            BiomeKind::Snow => "Snow Plains",
            BiomeKind::Desert => "Desert Dunes",
            BiomeKind::Alpine => "Alpine Ridge",
            BiomeKind::Coastal => "Coastal Drive",
            BiomeKind::City => "Tiny City",
        }
    }

    pub fn road_width(self) -> f64 {
        match self {
            BiomeKind::Desert => 13.0,
            BiomeKind::Alpine => 11.5,
            BiomeKind::City => 12.5,
            BiomeKind::Forest | BiomeKind::Snow | BiomeKind::Coastal => 12.0,
        }
    }

    pub fn avoid_radius(self) -> f64 {
        self.road_width() * AVOID_RADIUS_PER_ROAD_WIDTH
    }

    pub fn has_lakes(self) -> bool {
        self != BiomeKind::City
    }

    pub fn has_city(self) -> bool {
        self == BiomeKind::City
    }

    /// Places the biome's lakes and buildings.
    pub fn populate(self, rng: &mut impl Rng) -> Vec<Feature> {
        let mut features = vec![];

        if self.has_lakes() {
            let count = 2 + rng.random_range(0..3);
            for _ in 0..count {
                let radius = rng.random_range(LAKE_RADIUS.0..LAKE_RADIUS.1);
                let angle = rng.random_range(0.0..TAU);
                let distance = rng.random_range(LAKE_DISTANCE.0..LAKE_DISTANCE.1);
                features.push(Feature {
                    kind: FeatureKind::Lake,
                    footprint: Obstacle::Circle {
                        center: Position::default().advance(super::Angle::new(angle), distance),
                        radius,
                    },
                    height: 0.0,
                });
            }
        }

        if self.has_city() {
            let grid: i32 = 5 + rng.random_range(0..4);
            for gx in -grid..=grid {
                for gz in -grid..=grid {
                    // Plaza at the origin.
                    if gx == 0 && gz == 0 {
                        continue;
                    }
                    let width = rng.random_range(CITY_BLOCK_SIZE..2.0 * CITY_BLOCK_SIZE);
                    let depth = rng.random_range(CITY_BLOCK_SIZE..2.0 * CITY_BLOCK_SIZE);
                    let height = rng.random_range(20.0..100.0);
                    features.push(Feature {
                        kind: FeatureKind::Building,
                        footprint: Obstacle::Rect {
                            center: Position::new(
                                gx as f64 * 2.0 * CITY_BLOCK_SIZE,
                                gz as f64 * 2.0 * CITY_BLOCK_SIZE,
                            ),
                            half_x: 0.5 * width,
                            half_z: 0.5 * depth,
                        },
                        height,
                    });
                }
            }
        }

        features
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeatureKind {
    Lake,
    Building,
}

/// Scenery with a physical footprint. The footprint is the visible extent; the road keeps away
/// from the larger exclusion zone.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub footprint: Obstacle,
    pub height: f64,
}

impl Feature {
    pub fn exclusion_zone(&self, avoid_radius: f64) -> Obstacle {
        match (self.kind, &self.footprint) {
            (
                FeatureKind::Building,
                Obstacle::Rect {
                    center,
                    half_x,
                    half_z,
                },
            ) => Obstacle::Rect {
                center: *center,
                half_x: 2.0 * BUILDING_CLEARANCE_FACTOR * half_x + avoid_radius,
                half_z: 2.0 * BUILDING_CLEARANCE_FACTOR * half_z + avoid_radius,
            },
            _ => self.footprint.inflated(avoid_radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(BiomeKind::Forest, 26.4)]
    #[case(BiomeKind::Desert, 28.6)]
    #[case(BiomeKind::Alpine, 25.3)]
    #[case(BiomeKind::City, 27.5)]
    fn test_biome_avoid_radius(#[case] biome: BiomeKind, #[case] expected: f64) {
        assert_abs_diff_eq!(biome.avoid_radius(), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(BiomeKind::Forest)]
    #[case(BiomeKind::Snow)]
    #[case(BiomeKind::Coastal)]
    fn test_biome_lakes(#[case] biome: BiomeKind) {
        for seed in 0..20 {
            let features = biome.populate(&mut ChaCha8Rng::seed_from_u64(seed));
            assert!((2..=4).contains(&features.len()));
            for feature in features {
                assert_eq!(feature.kind, FeatureKind::Lake);
                let Obstacle::Circle { center, radius } = feature.footprint else {
                    panic!("lake must be circular");
                };
                assert!((50.0..110.0).contains(&radius));
                assert!((180.0..600.0 + 1e-9).contains(&center.length()));
            }
        }
    }

    #[test]
    fn test_biome_city_leaves_plaza_free() {
        let features = BiomeKind::City.populate(&mut ChaCha8Rng::seed_from_u64(4));
        assert!(!features.is_empty());
        let side = (features.len() + 1) as f64;
        assert_abs_diff_eq!(side.sqrt().fract(), 0.0);
        for feature in &features {
            assert_eq!(feature.kind, FeatureKind::Building);
            assert!(feature.footprint.center() != Position::default());
            assert!((20.0..100.0).contains(&feature.height));
        }
    }

    #[test]
    fn test_biome_populate_is_deterministic() {
        let a = BiomeKind::Forest.populate(&mut ChaCha8Rng::seed_from_u64(9));
        let b = BiomeKind::Forest.populate(&mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_feature_exclusion_zone() {
        let lake = Feature {
            kind: FeatureKind::Lake,
            footprint: Obstacle::Circle {
                center: Position::new(1.0, 1.0),
                radius: 60.0,
            },
            height: 0.0,
        };
        assert_eq!(
            lake.exclusion_zone(20.0),
            Obstacle::Circle {
                center: Position::new(1.0, 1.0),
                radius: 80.0
            }
        );

        let building = Feature {
            kind: FeatureKind::Building,
            footprint: Obstacle::Rect {
                center: Position::new(100.0, 0.0),
                half_x: 30.0,
                half_z: 40.0,
            },
            height: 50.0,
        };
        let Obstacle::Rect { half_x, half_z, .. } = building.exclusion_zone(20.0) else {
            panic!("building must be rectangular");
        };
        assert_abs_diff_eq!(half_x, 62.0, epsilon = 1e-9);
        assert_abs_diff_eq!(half_z, 76.0, epsilon = 1e-9);
    }
}
