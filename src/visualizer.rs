//! 3D visualization.

use std::f32::consts::FRAC_PI_2;

use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    pbr::{FogFalloff, FogSettings, NotShadowCaster},
    prelude::*,
    render::{mesh::Indices, render_asset::RenderAssetUsages, render_resource::PrimitiveTopology},
};
use nalgebra::Point3;

use crate::{
    domain::{
        road_indices, road_rows, BiomeKind, Feature, FeatureKind, GenerationMode, Obstacle,
        PathGenerator, Position,
    },
    resource::SessionRes,
    simulator::Simulation,
};

pub struct Visualizer;

impl Plugin for Visualizer {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, set_up)
            .add_systems(
                Update,
                (
                    handle_keyboard_input,
                    (update_world, update_car, update_camera, update_text)
                        .chain()
                        .after(Simulation),
                ),
            )
            .insert_resource(AmbientLight {
                color: Color::rgb_u8(0xff, 0xf1, 0xe0),
                brightness: 400.0,
            })
            .init_resource::<Scene>();
    }
}

#[derive(Resource, Default)]
pub struct Scene {
    /// Session generation currently shown.
    generation: Option<u64>,
    road: Option<Road>,
    decor: Vec<Entity>,
    car: Option<Entity>,
    ground: Option<Ground>,
    show_text: bool,
}

struct Road {
    entity: Entity,
    mesh: Handle<Mesh>,
    points: usize,
}

struct Ground {
    entity: Entity,
    material: Handle<StandardMaterial>,
}

struct Palette {
    sky: Color,
    fog: Color,
    ground: Color,
    road: Color,
    water: Color,
    building: Color,
}

impl From<BiomeKind> for Palette {
    fn from(biome: BiomeKind) -> Self {
        let (sky, fog, ground, road, water) = match biome {
            BiomeKind::Forest => (0xffebd6, 0xffe0c1, 0xf8ecd9, 0x4b4b4b, 0x7fd3ff),
            BiomeKind::Snow => (0xeef7ff, 0xe4f1ff, 0xf6fbff, 0x3e3e46, 0x9fdbff),
            BiomeKind::Desert => (0xfff0d6, 0xffe2bd, 0xffe8c2, 0x5a4a3f, 0x86defa),
            BiomeKind::Alpine => (0xffefe0, 0xffe4cf, 0xf7efe4, 0x3f3f44, 0x8cd8ff),
            BiomeKind::Coastal => (0xfff6e3, 0xffead2, 0xfdf5e6, 0x4a4e50, 0x74c7ff),
            BiomeKind::City => (0xffefe0, 0xffe3c9, 0xf6ebdd, 0x2f2f35, 0x80d4ff),
        };
        Self {
            sky: hex_color(sky),
            fog: hex_color(fog),
            ground: hex_color(ground),
            road: hex_color(road),
            water: hex_color(water),
            building: hex_color(0xe9d8c8),
        }
    }
}

const GROUND_SIZE: f32 = 6000.0;
const ROAD_ELEVATION: f32 = 0.02;
const WATER_ELEVATION: f32 = 0.01;
const FOG_START: f32 = 200.0;
const FOG_END: f32 = 1200.0;

fn set_up(
    mut scene: ResMut<Scene>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    create_ground(&mut scene, &mut commands, &mut meshes, &mut materials);
    create_car(&mut scene, &mut commands, &mut meshes, &mut materials);
    create_light(&mut commands);
    create_camera(&mut commands);
    create_text(&mut commands);
}

fn create_ground(
    scene: &mut ResMut<Scene>,
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let material = materials.add(StandardMaterial {
        perceptual_roughness: 1.0,
        ..default()
    });
    let entity = commands
        .spawn(PbrBundle {
            mesh: meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE)),
            material: material.clone(),
            ..default()
        })
        .id();
    scene.ground = Some(Ground { entity, material });
}

fn create_car(
    scene: &mut ResMut<Scene>,
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let paint = materials.add(StandardMaterial {
        base_color: Color::rgb_u8(0xff, 0x7a, 0x59),
        metallic: 0.1,
        perceptual_roughness: 0.5,
        ..default()
    });
    let glass = materials.add(StandardMaterial {
        base_color: Color::rgb_u8(0x3a, 0x44, 0x55),
        perceptual_roughness: 0.2,
        ..default()
    });
    let rubber = materials.add(StandardMaterial {
        base_color: Color::rgb_u8(0x2d, 0x24, 0x20),
        perceptual_roughness: 1.0,
        ..default()
    });

    // The car's length runs along the local x-axis.
    let body = commands
        .spawn(PbrBundle {
            mesh: meshes.add(Cuboid::new(4.4, 0.8, 2.2)),
            material: paint,
            transform: Transform::from_xyz(0.0, 0.35, 0.0),
            ..default()
        })
        .id();
    let cabin = commands
        .spawn(PbrBundle {
            mesh: meshes.add(Cuboid::new(2.2, 0.7, 1.9)),
            material: glass,
            transform: Transform::from_xyz(-0.3, 1.05, 0.0),
            ..default()
        })
        .id();
    let wheel_mesh = meshes.add(Cuboid::new(0.9, 0.6, 0.5));
    let wheels = [(1.5, 1.2), (1.5, -1.2), (-1.5, 1.2), (-1.5, -1.2)].map(|(x, z)| {
        commands
            .spawn(PbrBundle {
                mesh: wheel_mesh.clone(),
                material: rubber.clone(),
                transform: Transform::from_xyz(x, 0.0, z),
                ..default()
            })
            .id()
    });

    let car = commands.spawn(SpatialBundle::default()).id();
    commands
        .entity(car)
        .push_children(&[body, cabin])
        .push_children(&wheels);
    scene.car = Some(car);
}

fn create_light(commands: &mut Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            color: Color::rgb_u8(0xff, 0xc4, 0x8a),
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            0.3 * std::f32::consts::PI,
            -std::f32::consts::FRAC_PI_4,
        )),
        ..default()
    });
}

fn create_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3dBundle {
            tonemapping: Tonemapping::TonyMcMapface,
            ..default()
        },
        FogSettings {
            falloff: FogFalloff::Linear {
                start: FOG_START,
                end: FOG_END,
            },
            ..default()
        },
    ));
}

fn create_text(commands: &mut Commands) {
    let text_style = TextStyle {
        font_size: 20.0,
        color: Color::rgb_u8(0x3a, 0x2e, 0x28),
        ..default()
    };
    commands.spawn(
        TextBundle::from_sections(vec![
            TextSection::new("", text_style.clone()),
            TextSection::new("", text_style),
        ])
        .with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        }),
    );
}

/// Rebuilds the scenery after a regeneration and the road mesh whenever the road grew.
fn update_world(
    mut scene: ResMut<Scene>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut clear_color: ResMut<ClearColor>,
    mut fogs: Query<&mut FogSettings>,
    session: Res<SessionRes>,
) {
    let scene = &mut *scene;
    let world = session.world();

    if scene.generation == Some(session.generation()) {
        if let Some(road) = scene.road.as_mut() {
            let points = world.path().points().len();
            if road.points != points {
                if let Some(mesh) = meshes.get_mut(&road.mesh) {
                    *mesh = road_mesh(world.path(), world.road_width());
                }
                road.points = points;
            }
        }
        return;
    }

    for entity in scene.decor.drain(..) {
        commands.entity(entity).despawn_recursive();
    }
    if let Some(road) = scene.road.take() {
        commands.entity(road.entity).despawn();
        meshes.remove(&road.mesh);
    }

    let palette = Palette::from(world.biome());
    clear_color.0 = palette.sky;
    for mut fog in &mut fogs {
        fog.color = palette.fog;
    }
    if let Some(ground) = &scene.ground {
        if let Some(material) = materials.get_mut(&ground.material) {
            material.base_color = palette.ground;
        }
    }

    let mesh = meshes.add(road_mesh(world.path(), world.road_width()));
    let entity = commands
        .spawn(PbrBundle {
            mesh: mesh.clone(),
            material: materials.add(StandardMaterial {
                base_color: palette.road,
                perceptual_roughness: 0.95,
                metallic: 0.05,
                ..default()
            }),
            transform: Transform::from_xyz(0.0, ROAD_ELEVATION, 0.0),
            ..default()
        })
        .id();
    scene.road = Some(Road {
        entity,
        mesh,
        points: world.path().points().len(),
    });

    for feature in world.features() {
        scene.decor.push(create_feature(
            feature,
            &palette,
            &mut commands,
            &mut meshes,
            &mut materials,
        ));
    }

    scene.generation = Some(session.generation());
}

/// Flat ribbon through the road's edge points, facing up.
fn road_mesh(path: &dyn PathGenerator, width: f64) -> Mesh {
    let rows = road_rows(path.points(), width, path.step_length());
    let positions = rows
        .iter()
        .flat_map(|row| [row.left, row.right].map(|edge| to_bevy_position(edge).to_array()))
        .collect::<Vec<_>>();
    let uvs = rows
        .iter()
        .flat_map(|row| [[0.0, row.v as f32], [1.0, row.v as f32]])
        .collect::<Vec<_>>();
    let normals = vec![Vec3::Y.to_array(); positions.len()];

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(road_indices(rows.len(), path.is_closed())))
}

fn create_feature(
    feature: &Feature,
    palette: &Palette,
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) -> Entity {
    let color = match feature.kind {
        FeatureKind::Lake => palette.water,
        FeatureKind::Building => palette.building,
    };
    let material = materials.add(StandardMaterial {
        base_color: color,
        perceptual_roughness: 0.8,
        ..default()
    });

    match &feature.footprint {
        Obstacle::Circle { center, radius } => commands
            .spawn((
                PbrBundle {
                    mesh: meshes.add(Circle::new(*radius as f32)),
                    material,
                    transform: Transform::from_translation(
                        to_bevy_position(*center) + WATER_ELEVATION * Vec3::Y,
                    )
                    .with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
                    ..default()
                },
                NotShadowCaster,
            ))
            .id(),
        Obstacle::Rect {
            center,
            half_x,
            half_z,
        } => {
            let height = feature.height.max(0.1) as f32;
            commands
                .spawn(PbrBundle {
                    mesh: meshes.add(Cuboid::new(
                        2.0 * *half_x as f32,
                        height,
                        2.0 * *half_z as f32,
                    )),
                    material,
                    transform: Transform::from_translation(
                        to_bevy_position(*center) + 0.5 * height * Vec3::Y,
                    ),
                    ..default()
                })
                .id()
        }
    }
}

fn update_car(scene: Res<Scene>, mut transforms: Query<&mut Transform>, session: Res<SessionRes>) {
    let vehicle = session.world().vehicle();
    let position = to_bevy_position(vehicle.position());

    if let Some(entity) = scene.car {
        if let Ok(mut car_transform) = transforms.get_mut(entity) {
            *car_transform = Transform {
                translation: position + vehicle.elevation() as f32 * Vec3::Y,
                rotation: Quat::from_rotation_y(-f32::from(vehicle.yaw())),
                ..default()
            };
        }
    }

    // The ground plane travels with the car so it never runs out.
    if let Some(ground) = &scene.ground {
        if let Ok(mut ground_transform) = transforms.get_mut(ground.entity) {
            ground_transform.translation = position;
        }
    }
}

fn update_camera(
    mut cameras: Query<&mut Transform, With<Camera3d>>,
    session: Res<SessionRes>,
) {
    let camera = session.camera();
    for mut transform in cameras.iter_mut() {
        *transform = Transform::from_translation(to_vec3(camera.position()))
            .looking_at(to_vec3(camera.target()), Vec3::Y);
        transform.rotate_local_z(camera.roll() as f32);
    }
}

fn update_text(mut text: Query<&mut Text>, scene: Res<Scene>, session: Res<SessionRes>) {
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    let world = session.world();

    text.sections[0].value = format!(
        "Warm Drift - {}   {:.0} km/h",
        world.biome().label(),
        world.vehicle().speed_kmh()
    );
    text.sections[1].value = if scene.show_text {
        let mode = match world.mode() {
            GenerationMode::Endless => "endless",
            GenerationMode::Loop => "loop",
        };
        format!(
            "\n{mode} seed {}   heading {:3.0} deg   {} points   {} obstacles",
            world.seed(),
            world.vehicle().yaw().normalized().to_deg(),
            world.path().points().len(),
            world.obstacles().len()
        )
    } else {
        String::new()
    };
}

fn handle_keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut scene: ResMut<Scene>) {
    if keys.just_pressed(KeyCode::KeyT) {
        scene.show_text = !scene.show_text;
    }
}

fn hex_color(rgb: u32) -> Color {
    let [_, r, g, b] = rgb.to_be_bytes();
    Color::rgb_u8(r, g, b)
}

fn to_bevy_position(position: Position) -> Vec3 {
    Vec3::new(position.x() as f32, 0.0, position.z() as f32)
}

fn to_vec3(point: Point3<f64>) -> Vec3 {
    Vec3::new(point.x as f32, point.y as f32, point.z as f32)
}
