use std::sync::Arc;

use bevy::{
    asset::RenderAssetUsages,
    prelude::*,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};
use ndarray::Array3;

use crate::{
    error::Result,
    field::VectorField,
    lic::{LicJob, LicParams},
    progress::{CancelFlag, SharedProgress},
    types::{Texel, Value},
};

/// System sets for the LIC pipeline.
///
/// Use these to order your own systems relative to convolution:
///
/// ```rust,ignore
/// // Read the CPU-side volume before it is turned into a texture:
/// app.add_systems(Update, build_slices.after(LicSet::Generate)
///                                     .before(LicSet::Upload));
/// ```
///
/// ```text
/// LicSet::Spawn   →  [async compute]  →  LicSet::Generate  →  [your systems]  →  LicSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LicSet {
    /// Spawns an async compute task for each queued volume.
    Spawn,
    /// Polls async tasks and inserts [`GeneratedLic`] on completion.
    Generate,
    /// Uploads [`GeneratedLic`] into a 3D [`Image`] and inserts [`LicTexture`].
    Upload,
}

/// A vector field and noise volume to convolve.
///
/// Field and noise are wrapped in [`Arc`]s so the async task can read them
/// without copying.
#[derive(Component, Clone)]
#[require(LicProgress)]
pub struct LicVolume {
    pub field: Arc<VectorField>,
    pub noise: Arc<Array3<Value>>,
    pub params: LicParams,
}

impl LicVolume {
    pub fn new(field: Arc<VectorField>, noise: Arc<Array3<Value>>) -> Self {
        Self {
            field,
            noise,
            params: LicParams::default(),
        }
    }

    pub fn with_params(mut self, params: LicParams) -> Self {
        self.params = params;
        self
    }
}

/// Live progress of a [`LicVolume`] and a switch to abort it.
///
/// ```rust,ignore
/// fn abort_all(query: Query<&LicProgress>) {
///     for progress in &query {
///         progress.cancel();
///     }
/// }
/// ```
#[derive(Component, Clone, Default)]
pub struct LicProgress {
    progress: SharedProgress,
    cancel: CancelFlag,
}

impl LicProgress {
    /// Fraction of voxels convolved so far, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        self.progress.fraction()
    }

    /// Stops the running task between voxels. The volume is then dequeued without output.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Marker component added to [`LicVolume`] entities that are waiting to be processed.
///
/// Removed once the volume has been uploaded, or once its task failed or was cancelled.
#[derive(Component)]
pub struct QueuedLic;

/// Holds the in-flight async compute task for a [`LicVolume`].
#[derive(Component)]
pub struct LicTask(Task<Result<Array3<Texel>>>);

/// CPU-side result of a finished convolution, indexed `[i, j, k]`.
///
/// Only present between [`LicSet::Generate`] and [`LicSet::Upload`]; order
/// systems that read it inside that window.
#[derive(Component)]
pub struct GeneratedLic {
    pub values: Array3<Texel>,
}

/// The uploaded `R16Float` 3D texture: width along `i`, height along `j`, depth along `k`.
#[derive(Component)]
pub struct LicTexture(pub Handle<Image>);

/// Runtime configuration for the LIC pipeline.
///
/// Inserted as a resource by [`LicPlugin`]. Modify it at any time to change behaviour.
#[derive(Resource)]
pub struct LicConfig {
    /// Maximum number of convolution tasks spawned per frame. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for LicConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that convolves [`LicVolume`]s off the main thread.
///
/// ```text
/// LicVolume added
///   → QueuedLic inserted            (on_volume_add)
///   → LicTask spawned               (LicSet::Spawn)
///   → [async compute runs, LicProgress updates]
///   → GeneratedLic inserted         (LicSet::Generate, once task completes)
///   → [your systems here]
///   → LicTexture inserted           (LicSet::Upload)
///   → QueuedLic + GeneratedLic removed
/// ```
pub struct LicPlugin {
    /// Initial value for [`LicConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for LicPlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: LicConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for LicPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LicConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        });

        #[cfg(feature = "auto_queue")]
        app.configure_sets(
            Update,
            (LicSet::Spawn, LicSet::Generate, LicSet::Upload).chain(),
        )
        .add_systems(
            Update,
            (
                on_volume_add,
                spawn_lic_tasks.in_set(LicSet::Spawn),
                poll_lic_tasks.in_set(LicSet::Generate),
                upload_lic.in_set(LicSet::Upload),
            ),
        );
    }
}

/// Inserts [`QueuedLic`] on every newly added [`LicVolume`].
fn on_volume_add(mut commands: Commands, query: Query<Entity, (Added<LicVolume>, Without<QueuedLic>)>) {
    for entity in query.iter() {
        commands.entity(entity).insert(QueuedLic);
    }
}

/// Spawns async compute tasks for queued volumes, up to [`LicConfig::max_tasks_per_frame`] per frame.
fn spawn_lic_tasks(
    mut commands: Commands,
    config: Res<LicConfig>,
    query: Query<
        (Entity, &LicVolume, &LicProgress),
        (With<QueuedLic>, Without<LicTask>, Without<GeneratedLic>),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, volume, progress) in query.iter().take(config.max_tasks_per_frame) {
        let field = Arc::clone(&volume.field);
        let noise = Arc::clone(&volume.noise);
        let params = volume.params;
        let mut reporter = progress.progress.clone();
        let cancel = progress.cancel.clone();

        let task = task_pool.spawn(async move {
            LicJob::new(&field, &noise, params)
                .with_progress(&mut reporter)
                .with_cancel(cancel)
                .run()
        });

        debug!(?entity, shape = ?volume.field.shape(), "spawned LIC task");
        commands.entity(entity).insert(LicTask(task));
    }
}

/// Polls in-flight [`LicTask`]s and inserts [`GeneratedLic`] on success.
///
/// Failed or cancelled tasks are logged and dequeued.
fn poll_lic_tasks(mut commands: Commands, mut query: Query<(Entity, &mut LicTask)>) {
    for (entity, mut task) in query.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut task.0)) else {
            continue;
        };

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<LicTask>();
        match result {
            Ok(values) => {
                entity_commands.insert(GeneratedLic { values });
            }
            Err(e) => {
                warn!(?entity, "LIC task failed: {e}");
                entity_commands.remove::<QueuedLic>();
            }
        }
    }
}

/// Moves a [`GeneratedLic`] into a 3D texture, inserts [`LicTexture`], then removes
/// [`GeneratedLic`] and [`QueuedLic`].
fn upload_lic(
    mut commands: Commands,
    query: Query<(Entity, &GeneratedLic), With<QueuedLic>>,
    mut images: ResMut<Assets<Image>>,
) {
    for (entity, generated) in query.iter() {
        let image = volume_image(&generated.values);
        commands
            .entity(entity)
            .insert(LicTexture(images.add(image)))
            .remove::<(GeneratedLic, QueuedLic)>();
    }
}

/// Packs a LIC volume into an `R16Float` 3D image.
///
/// Texels are laid out with `i` varying fastest, as the texture's x axis.
pub fn volume_image(values: &Array3<Texel>) -> Image {
    let (nx, ny, nz) = values.dim();
    let data: Vec<u8> = values
        .view()
        .reversed_axes()
        .iter()
        .flat_map(|texel| texel.to_le_bytes())
        .collect();

    Image::new(
        Extent3d {
            width: nx as u32,
            height: ny as u32,
            depth_or_array_layers: nz as u32,
        },
        TextureDimension::D3,
        data,
        TextureFormat::R16Float,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
}
