pub mod ensemble;
pub mod error;
pub mod field;
pub mod interp;
pub mod lic;
pub mod noise;
pub mod plugin;
pub mod progress;
pub mod streamline;
pub mod types;
pub mod utils;
pub mod vector;

pub use field::VectorField;
pub use lic::{LicJob, LicParams, lic};
pub use plugin::LicPlugin;
