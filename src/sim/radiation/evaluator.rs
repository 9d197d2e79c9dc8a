//! Per-sensor integration of sky and ground radiance.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{RadiationError, Result};
use crate::geom::ray::Ray;
use crate::sim::engine::ContextScene;
use crate::sim::ground::GroundHemisphere;
use crate::sim::sky::matrix::SkyMatrix;
use crate::{Point, Vector};

use super::config::{EvaluationConfig, EvaluationMode};
use super::result::{IrradianceResult, RadiationUnit};
use super::sensor::SensorPoint;

/// Shared flag used to stop a running evaluation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sensor ready for tracing: offset ray origin and unit normal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PreparedSensor {
    pub origin: Point,
    pub normal: Vector,
}

/// Validates sensors and moves the ray origins along the normals.
pub(crate) fn prepare_sensors(sensors: &[SensorPoint], offset: f64) -> Result<Vec<PreparedSensor>> {
    sensors
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let normal = s.unit_normal(i)?;
            Ok(PreparedSensor {
                origin: s.position + normal * offset,
                normal,
            })
        })
        .collect()
}

/// Direction and solid angle of every sky patch followed by every ground patch.
pub(crate) fn dome_directions(
    sky: &SkyMatrix,
    ground: &GroundHemisphere,
) -> Result<Vec<(Vector, f64)>> {
    if sky.num_patches() != ground.num_patches() {
        return Err(RadiationError::DomeMismatch {
            sky: sky.num_patches(),
            ground: ground.num_patches(),
        });
    }
    Ok(sky
        .patches()
        .iter()
        .chain(ground.patches())
        .map(|p| (p.direction(), p.solid_angle()))
        .collect())
}

/// Radiance of every sky patch followed by every ground patch.
pub(crate) fn dome_radiance(sky: &SkyMatrix, ground: &GroundHemisphere) -> Vec<f64> {
    sky.patches()
        .iter()
        .chain(ground.patches())
        .map(|p| p.radiance())
        .collect()
}

/// Weight `Ω·cos θ` of a patch seen from the sensor, zero when the patch is
/// behind the sensor or hidden by the scene.
#[inline]
pub(crate) fn patch_weight(
    sensor: &PreparedSensor,
    direction: Vector,
    solid_angle: f64,
    scene: &ContextScene,
) -> f64 {
    let cos = sensor.normal.dot(direction);
    if cos <= 0.0 {
        return 0.0;
    }
    if !scene.is_empty() {
        let ray = Ray {
            origin: sensor.origin,
            direction,
        };
        if scene.is_occluded(&ray) {
            return 0.0;
        }
    }
    solid_angle * cos
}

/// Runs `f` on a dedicated pool when a thread count is given.
pub(crate) fn run_in_pool<T, F>(num_threads: Option<usize>, f: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match num_threads {
        None => Ok(f()),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| RadiationError::config(format!("thread pool: {e}")))?;
            Ok(pool.install(f))
        }
    }
}

/// Scale applied to the summed radiance and the resulting unit.
pub(crate) fn mode_factor(mode: EvaluationMode, duration_hours: f64) -> (f64, RadiationUnit) {
    match mode {
        EvaluationMode::Cumulative => (duration_hours, RadiationUnit::WattHoursPerSquareMeter),
        EvaluationMode::AverageIrradiance => (1.0, RadiationUnit::WattsPerSquareMeter),
    }
}

/// Computes the incident radiation on every sensor.
///
/// For each sensor the contributions `L·Ω·cos θ` of all sky patches and then
/// all ground patches are summed in order. Patches behind the sensor or
/// hidden by the context scene contribute nothing. Sensors are processed in
/// parallel; each one writes only its own slot of the result buffer.
pub fn evaluate(
    sensors: &[SensorPoint],
    scene: &ContextScene,
    sky: &SkyMatrix,
    ground: &GroundHemisphere,
    config: &EvaluationConfig,
    cancel: Option<&CancellationToken>,
) -> Result<IrradianceResult> {
    config.validate()?;
    let dome = dome_directions(sky, ground)?;
    let radiance = dome_radiance(sky, ground);
    let prepared = prepare_sensors(sensors, config.offset)?;
    let (factor, unit) = mode_factor(config.mode, sky.duration_hours());

    debug!(
        sensors = prepared.len(),
        patches = dome.len(),
        occluders = scene.num_triangles(),
        "Evaluating radiation"
    );

    let evaluated = AtomicUsize::new(0);
    let mut values = vec![0.0; prepared.len()];

    let outcome = run_in_pool(config.num_threads, || {
        values
            .par_iter_mut()
            .zip(prepared.par_iter())
            .try_for_each(|(value, sensor)| {
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    return Err(());
                }
                let mut sum = 0.0;
                for ((direction, solid_angle), l) in dome.iter().zip(&radiance) {
                    let w = patch_weight(sensor, *direction, *solid_angle, scene);
                    sum += w * l;
                }
                *value = sum * factor;
                evaluated.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
    })?;

    if outcome.is_err() {
        let evaluated = evaluated.load(Ordering::Relaxed);
        info!(evaluated, "Radiation evaluation cancelled");
        return Err(RadiationError::Cancelled { evaluated });
    }

    Ok(IrradianceResult::new(values, unit))
}
