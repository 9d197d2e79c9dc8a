pub mod clear_sky;
pub mod dome;
pub mod luminance;
pub mod matrix;

pub use clear_sky::ClearSkyModel;
pub use dome::{PatchGeometry, SkyDensity};
pub use luminance::DiffuseModel;
pub use matrix::{SkyConfig, SkyKind, SkyMatrix, SkyPatch, SkySource};
