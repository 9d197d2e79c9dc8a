pub mod config;
pub mod evaluator;
pub mod intersection;
pub mod result;
pub mod sensor;
pub mod study;

pub use config::{EvaluationConfig, EvaluationMode, StudyConfig};
pub use evaluator::{CancellationToken, evaluate};
pub use intersection::IntersectionMatrix;
pub use result::{IrradianceResult, RadiationUnit, ResultSummary};
pub use sensor::{GridInfo, SensorGrid, SensorPoint, join_grids};
pub use study::{RadiationStudy, Stage, StudyOutput};
