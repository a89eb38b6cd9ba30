use std::sync::Arc;

use bevy::prelude::*;
use bevy_lic::{
    LicPlugin, VectorField,
    lic::LicParams,
    noise::{NoiseSource, UniformNoise},
    plugin::{GeneratedLic, LicProgress, LicSet, LicVolume, QueuedLic},
    vector::vector,
};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use noiz::prelude::*;

type FlowNoise = Noise<
    LayeredNoise<
        Normed<f32>,
        Persistence,
        Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
    >,
>;

const SIZE: usize = 32;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, LicPlugin::default(), PanOrbitCameraPlugin))
        .add_systems(Startup, setup)
        .add_systems(Update, (report_progress, cancel_on_key))
        .add_systems(
            Update,
            show_slice.after(LicSet::Generate).before(LicSet::Upload),
        )
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera::default(),
        Transform::from_xyz(SIZE as f32 / 2., SIZE as f32 / 2., SIZE as f32 * 1.5)
            .looking_at(Vec3::new(SIZE as f32 / 2., SIZE as f32 / 2., 0.), Vec3::Y),
    ));

    let mut noise = FlowNoise::default();
    noise.set_frequency(0.08);

    // three decorrelated noise samples per grid point
    let field = VectorField::from_fn([SIZE, SIZE, SIZE], |p| {
        let at = Vec3::new(p.x as f32, p.y as f32, p.z as f32);
        let x: f32 = noise.sample_for(at);
        let y: f32 = noise.sample_for(at + Vec3::splat(101.0));
        let z: f32 = noise.sample_for(at - Vec3::splat(57.0));
        vector(x, y, z)
    });
    let white = UniformNoise::seeded(7).volume(field.shape());

    commands.spawn(
        LicVolume::new(Arc::new(field), Arc::new(white)).with_params(LicParams::new(0.5, 16)),
    );
}

fn report_progress(query: Query<&LicProgress, With<QueuedLic>>, mut last_decile: Local<u32>) {
    for progress in query.iter() {
        let decile = (progress.fraction() * 10.0) as u32;
        if decile > *last_decile {
            *last_decile = decile;
            info!("LIC {}% done", decile * 10);
        }
    }
}

fn cancel_on_key(keyboard: Res<ButtonInput<KeyCode>>, query: Query<&LicProgress>) {
    if keyboard.just_pressed(KeyCode::KeyC) {
        for progress in query.iter() {
            progress.cancel();
        }
    }
}

/// Draws the middle `k` slice of each finished volume as a grid of shaded tiles.
fn show_slice(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    query: Query<&GeneratedLic, Added<GeneratedLic>>,
) {
    for generated in query.iter() {
        let (nx, ny, nz) = generated.values.dim();
        let tile = meshes.add(Cuboid::new(0.95, 0.95, 0.1));
        let k = nz / 2;

        for i in 0..nx {
            for j in 0..ny {
                let v = generated.values[[i, j, k]].to_f32();
                commands.spawn((
                    Mesh3d(tile.clone()),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgb(v, v, v),
                        unlit: true,
                        ..Default::default()
                    })),
                    Transform::from_xyz(i as f32, j as f32, 0.),
                ));
            }
        }
    }
}
