pub mod engine;
pub mod ground;
pub mod period;
pub mod radiation;
pub mod sky;
pub mod solar;
pub mod weather;
