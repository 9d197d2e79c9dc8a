pub mod error;
pub mod geom;
pub mod io;
pub mod sim;

// Prelude
pub use error::{GeometryKind, RadiationError};
pub use geom::face::Face;
pub use geom::mesh::Mesh;
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use sim::engine::ContextScene;
pub use sim::ground::GroundHemisphere;
pub use sim::period::AnalysisPeriod;
pub use sim::radiation::{
    CancellationToken, EvaluationConfig, EvaluationMode, IntersectionMatrix, IrradianceResult,
    RadiationStudy, RadiationUnit, SensorGrid, SensorPoint, Stage, StudyConfig, evaluate,
};
pub use sim::sky::{ClearSkyModel, DiffuseModel, SkyConfig, SkyDensity, SkyMatrix, SkySource};
pub use sim::weather::{Location, Timestamp, WeatherSeries};
