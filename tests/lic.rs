//! End-to-end behaviour of the convolution through the public API.

use bevy_lic::{
    LicJob, LicParams, VectorField,
    ensemble::VectorEnsemble,
    error::LicError,
    lic,
    noise::{FixedNoise, NoiseSource, UniformNoise},
    types::Texel,
    vector::{grid_point, point, vector},
};
use ndarray::{Array3, Array4};

fn indexed_noise(shape: [usize; 3]) -> Array3<f64> {
    let n = (shape[0] * shape[1] * shape[2]) as f64;
    Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(i, j, k)| {
        (i * shape[1] * shape[2] + j * shape[2] + k) as f64 / n
    })
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn zero_field_reproduces_noise() {
    let field = VectorField::new(Array4::zeros((2, 2, 2, 3))).unwrap();
    let noise = UniformNoise::seeded(11).volume(field.shape());

    let out = lic(&field, &noise, LicParams::new(0.5, 7)).unwrap();

    assert_eq!(out.dim(), (2, 2, 2));
    for ((i, j, k), value) in out.indexed_iter() {
        assert_eq!(*value, Texel::from_f64(noise[[i, j, k]]));
    }
}

#[test]
fn uniform_x_flow_averages_x_neighbours() {
    let field = VectorField::uniform([3, 3, 3], vector(1.0, 0.0, 0.0));
    let noise = indexed_noise([3, 3, 3]);

    let out = lic(&field, &noise, LicParams::new(1.0, 1)).unwrap();

    for ((i, j, k), value) in out.indexed_iter() {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(2);
        let cells: Vec<f64> = (lo..=hi).map(|x| noise[[x, j, k]]).collect();
        let expected = cells.iter().sum::<f64>() / cells.len() as f64;
        assert_eq!(*value, Texel::from_f64(expected), "voxel ({i}, {j}, {k})");

        let line = field.make_streamline_both(grid_point(i, j, k), 1.0, 1).unwrap();
        assert_eq!(line.len(), cells.len());
    }
}

#[test]
fn output_stays_in_unit_interval() {
    let field = VectorField::from_fn([9, 7, 5], |p| vector(p.y - 3.0, 4.0 - p.x, 0.25));
    let out = bevy_lic::lic::lic_with_noise(&field, LicParams::new(0.2, 12), &mut UniformNoise::seeded(5)).unwrap();
    assert!(out.iter().all(|v| (0.0..=1.0).contains(&v.to_f64())));
}

// ============================================================================
// Streamlines
// ============================================================================

#[test]
fn streamlines_respect_composition_law() {
    let field = VectorField::from_fn([8, 8, 8], |p| vector(p.y - 4.0, 4.0 - p.x, 0.1 * p.z));
    let steps = 5;
    for seed in [point(0.0, 0.0, 0.0), point(4.0, 3.0, 2.0), point(7.0, 7.0, 7.0)] {
        let line = field.make_streamline_both(seed, 0.3, steps).unwrap();
        let back = line.backward().len();
        let fwd = line.forward().len();
        assert!(back <= steps && fwd <= steps);
        assert_eq!(line.len(), back + 1 + fwd);
        assert_eq!(line.points()[back], seed);
    }
}

#[test]
fn edge_seed_leaving_domain_has_no_forward_points() {
    let field = VectorField::uniform([4, 4, 4], vector(0.0, 0.0, 2.0));
    let line = field.make_streamline_both(point(1.0, 1.0, 3.0), 1.0, 10).unwrap();
    assert!(line.forward().is_empty());
    assert_eq!(line.backward(), &[point(1.0, 1.0, 1.0)]);
}

#[test]
fn out_of_domain_seed_is_an_error() {
    let field = VectorField::zeros([2, 2, 2]);
    assert!(matches!(
        field.make_streamline_both(point(0.0, 2.0, 0.0), 1.0, 1),
        Err(LicError::PointOutOfDomain { .. })
    ));
}

// ============================================================================
// Ensembles and collaborators
// ============================================================================

#[test]
fn ensemble_average_feeds_the_driver() {
    let ensemble = VectorEnsemble::new(vec![
        VectorField::uniform([3, 2, 2], vector(2.0, 0.0, 0.0)),
        VectorField::uniform([3, 2, 2], vector(-2.0, 0.0, 0.0)),
    ])
    .unwrap();
    let noise = indexed_noise([3, 2, 2]);

    // the mean field is zero, so every voxel keeps its own noise value
    let out = lic(ensemble.average_field(), &noise, LicParams::default()).unwrap();
    assert_eq!(out[[2, 1, 0]], Texel::from_f64(noise[[2, 1, 0]]));
}

#[test]
fn fixed_noise_is_deterministic() {
    let field = VectorField::uniform([5, 5, 5], vector(0.3, -0.2, 0.1));
    let mut source = FixedNoise(indexed_noise([5, 5, 5]));
    let params = LicParams::new(1.0, 4);
    let a = bevy_lic::lic::lic_with_noise(&field, params, &mut source).unwrap();
    let b = bevy_lic::lic::lic_with_noise(&field, params, &mut source).unwrap();
    assert_eq!(a, b);
}

#[test]
fn job_reports_progress_through_shared_handle() {
    let field = VectorField::uniform([4, 3, 2], vector(1.0, 1.0, 0.0));
    let noise = indexed_noise([4, 3, 2]);
    let progress = bevy_lic::progress::SharedProgress::new();
    let mut writer = progress.clone();

    LicJob::new(&field, &noise, LicParams::default())
        .with_progress(&mut writer)
        .run()
        .unwrap();

    assert_eq!(progress.fraction(), 1.0);
}
