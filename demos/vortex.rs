//! Convolves a helical vortex and prints the middle slice as ASCII shading.
//!
//! ```text
//! cargo run --release --example vortex
//! ```

use bevy_lic::{
    LicJob, LicParams, VectorField,
    noise::{NoiseSource, UniformNoise},
    progress::ProgressBar,
    vector::vector,
};

const SIZE: usize = 48;
const SHADES: &[u8] = b" .:-=+*#%@";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let center = SIZE as f64 / 2.0;
    let field = VectorField::from_fn([SIZE, SIZE, SIZE], |p| {
        let (dx, dy) = (p.x - center, p.y - center);
        vector(-dy, dx, 0.15 * center)
    });
    let noise = UniformNoise::seeded(2024).volume(field.shape());

    let mut bar = ProgressBar::stderr();
    let values = LicJob::new(&field, &noise, LicParams::new(0.05, 20))
        .with_progress(&mut bar)
        .run()?;

    let (min, max, sum) = values.iter().map(|v| v.to_f64()).fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(lo, hi, sum), v| (lo.min(v), hi.max(v), sum + v),
    );
    println!(
        "{field}: min {min:.3}, max {max:.3}, mean {:.3}",
        sum / values.len() as f64
    );

    let k = SIZE / 2;
    for j in (0..SIZE).rev() {
        let row: String = (0..SIZE)
            .map(|i| {
                let v = values[[i, j, k]].to_f64();
                let t = ((v - min) / (max - min).max(f64::EPSILON)).clamp(0.0, 1.0);
                SHADES[(t * (SHADES.len() - 1) as f64).round() as usize] as char
            })
            .collect();
        println!("{row}");
    }

    Ok(())
}
