use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{game::configs::SceneryConfig, screens::Screen};

/// Marker component for static enclosure geometry
#[derive(Component)]
pub struct EnclosureEntity;

/// Rocks hug the walls inside this band past `wall_length / 2 - 5`
const ROCK_RING_INSET: f32 = 5.0;
const ROCK_RING_WIDTH: f32 = 10.0;
/// Trees stay this far from the walls
const TREE_WALL_MARGIN: f32 = 20.0;

/// Center and rotation of each of the four walls
pub fn wall_layout(config: &SceneryConfig) -> [Transform; 4] {
    let half = config.wall_length / 2.0;
    let y = config.wall_height / 2.0;
    [
        Transform::from_xyz(0.0, y, half),
        Transform::from_xyz(0.0, y, -half),
        Transform::from_xyz(half, y, 0.0).with_rotation(Quat::from_rotation_y(FRAC_PI_2)),
        Transform::from_xyz(-half, y, 0.0).with_rotation(Quat::from_rotation_y(FRAC_PI_2)),
    ]
}

/// Rocks on a ring just inside the walls, randomly tumbled and squashed.
pub fn scatter_rocks(rng: &mut impl Rng, config: &SceneryConfig) -> Vec<Transform> {
    let inner = config.wall_length / 2.0 - ROCK_RING_INSET;
    (0..config.rock_count)
        .map(|_| {
            let angle = rng.random::<f32>() * TAU;
            let radius = inner + rng.random::<f32>() * ROCK_RING_WIDTH;
            let height = rng.random::<f32>() * 2.0;
            let rotation = Quat::from_euler(
                EulerRot::XYZ,
                rng.random::<f32>() * PI,
                rng.random::<f32>() * PI,
                rng.random::<f32>() * PI,
            );
            let scale = Vec3::new(
                0.7 + rng.random::<f32>(),
                0.5 + rng.random::<f32>(),
                0.5 + rng.random::<f32>(),
            );
            Transform::from_xyz(angle.cos() * radius, height, angle.sin() * radius)
                .with_rotation(rotation)
                .with_scale(scale)
        })
        .collect()
}

/// Trees inside the walls, outside the central clearing
pub fn scatter_trees(rng: &mut impl Rng, config: &SceneryConfig) -> Vec<Transform> {
    let clearing = config.clearing_radius.max(0.0);
    let outer = (config.wall_length / 2.0 - TREE_WALL_MARGIN).max(clearing);
    (0..config.tree_count)
        .map(|_| {
            let x = rng.random_range(-outer..=outer);
            let z = rng.random_range(-outer..=outer);
            let mut position = Vec3::new(x, 0.0, z);
            let distance = position.length();
            if distance < clearing {
                // Push out radially, keep the angle
                let direction = if distance > f32::EPSILON {
                    position / distance
                } else {
                    Vec3::X
                };
                position = direction * rng.random_range(clearing..=outer);
            }
            let scale = rng.random_range(0.8..1.4);
            Transform::from_translation(position)
                .with_rotation(Quat::from_rotation_y(rng.random::<f32>() * TAU))
                .with_scale(Vec3::splat(scale))
        })
        .collect()
}

/// Spawn the ground, walls, rocks, trees and lights
pub fn spawn_enclosure(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<SceneryConfig>,
) {
    info!("Spawning enclosure...");
    let mut rng = StdRng::seed_from_u64(config.seed);

    let ground_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x3a, 0x7d, 0x44),
        perceptual_roughness: 0.8,
        metallic: 0.2,
        ..default()
    });
    // Dark grey, fully rough: reads as rock
    let stone_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x69, 0x69, 0x69),
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..default()
    });
    let bark_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.24, 0.14),
        perceptual_roughness: 1.0,
        ..default()
    });
    let leaf_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.13, 0.38, 0.16),
        perceptual_roughness: 0.9,
        ..default()
    });

    // ===== GROUND =====
    commands.spawn((
        DespawnOnExit(Screen::Gameplay),
        EnclosureEntity,
        Name::new("Ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(config.ground_size, config.ground_size))),
        MeshMaterial3d(ground_material),
        Transform::default(),
    ));

    // ===== WALLS =====
    let wall_mesh = meshes.add(Cuboid::new(
        config.wall_length,
        config.wall_height,
        config.wall_thickness,
    ));
    for (i, transform) in wall_layout(&config).into_iter().enumerate() {
        commands.spawn((
            DespawnOnExit(Screen::Gameplay),
            EnclosureEntity,
            Name::new(format!("Wall {i}")),
            Mesh3d(wall_mesh.clone()),
            MeshMaterial3d(stone_material.clone()),
            transform,
        ));
    }

    // ===== ROCKS =====
    // Low-poly sphere stands in for a dodecahedron
    let rock_mesh = meshes.add(Sphere::new(config.rock_radius).mesh().uv(7, 5));
    for (i, transform) in scatter_rocks(&mut rng, &config).into_iter().enumerate() {
        commands.spawn((
            DespawnOnExit(Screen::Gameplay),
            EnclosureEntity,
            Name::new(format!("Rock {i}")),
            Mesh3d(rock_mesh.clone()),
            MeshMaterial3d(stone_material.clone()),
            transform,
        ));
    }

    // ===== TREES =====
    let trunk_height = 6.0;
    let crown_height = 10.0;
    let trunk_mesh = meshes.add(Cylinder::new(0.6, trunk_height));
    let crown_mesh = meshes.add(Cone {
        radius: 4.0,
        height: crown_height,
    });
    for (i, transform) in scatter_trees(&mut rng, &config).into_iter().enumerate() {
        commands.spawn((
            DespawnOnExit(Screen::Gameplay),
            EnclosureEntity,
            Name::new(format!("Tree {i}")),
            transform,
            Visibility::Visible,
            children![
                (
                    Mesh3d(trunk_mesh.clone()),
                    MeshMaterial3d(bark_material.clone()),
                    Transform::from_xyz(0.0, trunk_height / 2.0, 0.0),
                ),
                (
                    Mesh3d(crown_mesh.clone()),
                    MeshMaterial3d(leaf_material.clone()),
                    Transform::from_xyz(0.0, trunk_height + crown_height / 2.0, 0.0),
                ),
            ],
        ));
    }

    // ===== LIGHTING =====
    commands.spawn((
        DespawnOnExit(Screen::Gameplay),
        EnclosureEntity,
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(5.0, 5.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 500.0,
        affects_lightmapped_meshes: false,
    });

    info!("Enclosure spawned successfully!");
}
