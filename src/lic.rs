use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use ndarray::{Array3, ArrayView3};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, trace};

use crate::{
    error::{LicError, Result},
    field::VectorField,
    noise::NoiseSource,
    progress::{CancelFlag, ProgressReporter},
    streamline::Streamline,
    types::{Shape, Texel, Value},
    utils::cell_count,
    vector::{as_indices, grid_point},
};

/// Parameters of a convolution run.
///
/// ```rust,ignore
/// let params = LicParams::default().with_delta_t(0.5).with_detail(20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LicParams {
    /// Euler time step between streamline points.
    pub delta_t: Value,
    /// Maximum integration steps in each direction. Higher values give longer
    /// streaks and a smoother texture, at linear cost.
    pub detail: usize,
    /// Distribute outer slices over the rayon pool. Output is identical either way.
    pub parallel: bool,
}

impl Default for LicParams {
    fn default() -> Self {
        Self {
            delta_t: 1.0,
            detail: 10,
            parallel: true,
        }
    }
}

impl LicParams {
    pub fn new(delta_t: Value, detail: usize) -> Self {
        Self {
            delta_t,
            detail,
            ..Default::default()
        }
    }

    pub fn with_delta_t(mut self, delta_t: Value) -> Self {
        self.delta_t = delta_t;
        self
    }

    pub fn with_detail(mut self, detail: usize) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.delta_t > 0.0 && self.delta_t.is_finite()) {
            return Err(LicError::InvalidTimeStep(self.delta_t));
        }
        if self.detail == 0 {
            return Err(LicError::InvalidStepCount);
        }
        Ok(())
    }
}

/// Convolves `noise` along the streamline through every voxel of `field`.
///
/// `noise` must have the field's shape. Returns one `f16` per voxel, the plain
/// mean of the noise values under the voxel's streamline.
pub fn lic(field: &VectorField, noise: &Array3<Value>, params: LicParams) -> Result<Array3<Texel>> {
    LicJob::new(field, noise, params).run()
}

/// Draws a noise volume from `source` and runs [`lic`] with it.
pub fn lic_with_noise<N: NoiseSource + ?Sized>(
    field: &VectorField,
    params: LicParams,
    source: &mut N,
) -> Result<Array3<Texel>> {
    let noise = source.volume(field.shape());
    lic(field, &noise, params)
}

/// Mean noise value over the grid cells a streamline passes through.
///
/// Every point counts once regardless of the distance to its neighbours.
pub fn convolve_streamline(streamline: &Streamline, noise: &ArrayView3<'_, Value>) -> Value {
    // TODO: weight each sample by its integration step distance.
    let sum: Value = streamline.iter().map(|p| noise[as_indices(p)]).sum();
    sum / streamline.len() as Value
}

/// A configured convolution with optional progress reporting and cancellation.
///
/// ```rust,ignore
/// let mut bar = ProgressBar::stderr();
/// let out = LicJob::new(&field, &noise, LicParams::default())
///     .with_progress(&mut bar)
///     .with_cancel(flag.clone())
///     .run()?;
/// ```
pub struct LicJob<'a> {
    field: &'a VectorField,
    noise: &'a Array3<Value>,
    params: LicParams,
    progress: Option<&'a mut dyn ProgressReporter>,
    cancel: Option<CancelFlag>,
}

impl<'a> LicJob<'a> {
    pub fn new(field: &'a VectorField, noise: &'a Array3<Value>, params: LicParams) -> Self {
        Self {
            field,
            noise,
            params,
            progress: None,
            cancel: None,
        }
    }

    /// Reports `processed / total` after voxels complete, then a final `1.0`.
    ///
    /// Reported fractions never decrease. The parallel path may skip reports.
    pub fn with_progress(mut self, reporter: &'a mut dyn ProgressReporter) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// Aborts with [`LicError::Cancelled`] once `flag` is set, checked between voxels.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(self) -> Result<Array3<Texel>> {
        let shape = self.field.shape();
        let (nx, ny, nz) = self.noise.dim();
        if [nx, ny, nz] != shape {
            return Err(LicError::NoiseShapeMismatch {
                expected: shape,
                found: [nx, ny, nz],
            });
        }
        self.params.validate()?;

        let started = Instant::now();
        debug!(
            ?shape,
            delta_t = self.params.delta_t,
            detail = self.params.detail,
            parallel = self.params.parallel,
            "line integral convolution started"
        );

        let total = cell_count(shape);
        let mut progress = self.progress.map(|reporter| Progress::new(reporter, total));
        let kernel = Kernel {
            field: self.field,
            noise: self.noise.view(),
            params: self.params,
            cancel: self.cancel.as_ref(),
        };

        let values = if self.params.parallel {
            kernel.run_parallel(progress.as_mut())?
        } else {
            kernel.run_serial(progress.as_mut())?
        };

        if let Some(progress) = progress.as_mut() {
            progress.finish();
        }
        debug!(voxels = total, elapsed = ?started.elapsed(), "line integral convolution finished");

        Ok(Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)?)
    }
}

/// Tracks the last reported voxel count so fractions only ever increase.
struct Progress<'r> {
    reporter: &'r mut dyn ProgressReporter,
    reported: usize,
    total: usize,
}

impl<'r> Progress<'r> {
    fn new(reporter: &'r mut dyn ProgressReporter, total: usize) -> Self {
        Self {
            reporter,
            reported: 0,
            total,
        }
    }

    fn advance(&mut self, processed: usize) {
        if processed > self.reported {
            self.reported = processed;
            self.reporter.report(processed as f64 / self.total as f64);
        }
    }

    fn finish(&mut self) {
        if self.reported < self.total || self.total == 0 {
            self.reported = self.total;
            self.reporter.report(1.0);
        }
    }
}

/// Shared read-only state of one run.
struct Kernel<'a> {
    field: &'a VectorField,
    noise: ArrayView3<'a, Value>,
    params: LicParams,
    cancel: Option<&'a CancelFlag>,
}

impl Kernel<'_> {
    fn shape(&self) -> Shape {
        self.field.shape()
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.is_cancelled() => Err(LicError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Output value of voxel `(i, j, k)`.
    #[inline]
    fn voxel(&self, i: usize, j: usize, k: usize) -> Result<Texel> {
        let streamline =
            self.field
                .make_streamline_both(grid_point(i, j, k), self.params.delta_t, self.params.detail)?;
        Ok(Texel::from_f64(convolve_streamline(&streamline, &self.noise)))
    }

    fn run_serial(&self, mut progress: Option<&mut Progress<'_>>) -> Result<Vec<Texel>> {
        let [nx, ny, nz] = self.shape();
        let mut values = Vec::with_capacity(nx * ny * nz);

        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    self.check_cancelled()?;
                    values.push(self.voxel(i, j, k)?);
                    if let Some(progress) = progress.as_deref_mut() {
                        progress.advance(values.len());
                    }
                }
            }
        }

        Ok(values)
    }

    /// Computes one x slice per rayon task and concatenates them in order.
    fn run_parallel(&self, progress: Option<&mut Progress<'_>>) -> Result<Vec<Texel>> {
        let [nx, ny, nz] = self.shape();
        let processed = AtomicUsize::new(0);
        let progress = progress.map(Mutex::new);

        let per_x: Vec<Vec<Texel>> = (0..nx)
            .into_par_iter()
            .map(|i| -> Result<Vec<Texel>> {
                let mut local = Vec::with_capacity(ny * nz);
                for j in 0..ny {
                    for k in 0..nz {
                        self.check_cancelled()?;
                        local.push(self.voxel(i, j, k)?);
                        processed.fetch_add(1, Ordering::Relaxed);

                        // Busy reporter means another worker is reporting; skip.
                        if let Some(Ok(mut progress)) = progress.as_ref().map(Mutex::try_lock) {
                            progress.advance(processed.load(Ordering::Relaxed));
                        }
                    }
                }
                trace!(slice = i, "slice convolved");
                Ok(local)
            })
            .collect::<Result<_>>()?;

        let mut values = Vec::with_capacity(nx * ny * nz);
        for mut slice in per_x {
            values.append(&mut slice);
        }
        Ok(values)
    }
}
