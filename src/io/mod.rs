//! File I/O: weather series, sensor points, context geometry and results.

pub mod pts;
pub mod results;
pub mod stl;
pub mod weather;

pub use pts::{read_pts, write_pts};
pub use results::{write_grid_results, write_summary, write_values_csv};
pub use stl::{StlFormat, read_stl, write_stl};
pub use weather::read_weather;
