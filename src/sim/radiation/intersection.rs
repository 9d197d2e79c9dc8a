use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RadiationError, Result};
use crate::sim::engine::ContextScene;
use crate::sim::ground::GroundHemisphere;
use crate::geom::vector::Vector;
use crate::sim::sky::matrix::SkyMatrix;

use super::config::{EvaluationConfig, EvaluationMode};
use super::evaluator::{
    CancellationToken, dome_directions, dome_radiance, mode_factor, patch_weight,
    prepare_sensors, run_in_pool,
};
use super::result::IrradianceResult;
use super::sensor::SensorPoint;

/// Geometric half of the evaluation: one row per sensor, one column per sky
/// patch followed by one per ground patch, holding `visibility·Ω·cos θ`.
///
/// The matrix can be re-applied to any sky and ground pair with the same
/// dome layout. Patch directions are kept so that a sky with another density
/// or north angle is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionMatrix {
    weights: Array2<f64>,
    num_sky: usize,
    directions: Vec<Vector>,
}

impl IntersectionMatrix {
    pub fn compute(
        sensors: &[SensorPoint],
        scene: &ContextScene,
        sky: &SkyMatrix,
        ground: &GroundHemisphere,
        config: &EvaluationConfig,
        cancel: Option<&CancellationToken>,
    ) -> Result<Self> {
        config.validate()?;
        let dome = dome_directions(sky, ground)?;
        let prepared = prepare_sensors(sensors, config.offset)?;
        let n_patches = dome.len();

        let evaluated = AtomicUsize::new(0);
        let mut buffer = vec![0.0; prepared.len() * n_patches];

        let outcome = run_in_pool(config.num_threads, || {
            buffer
                .par_chunks_mut(n_patches.max(1))
                .zip(prepared.par_iter())
                .try_for_each(|(row, sensor)| {
                    if cancel.is_some_and(CancellationToken::is_cancelled) {
                        return Err(());
                    }
                    for (w, (direction, solid_angle)) in row.iter_mut().zip(&dome) {
                        *w = patch_weight(sensor, *direction, *solid_angle, scene);
                    }
                    evaluated.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
        })?;

        if outcome.is_err() {
            return Err(RadiationError::Cancelled {
                evaluated: evaluated.load(Ordering::Relaxed),
            });
        }

        let weights = Array2::from_shape_vec((prepared.len(), n_patches), buffer)
            .map_err(|e| RadiationError::config(format!("intersection matrix shape: {e}")))?;
        debug!(
            sensors = weights.nrows(),
            patches = weights.ncols(),
            "Computed intersection matrix"
        );

        Ok(Self {
            weights,
            num_sky: sky.num_patches(),
            directions: dome.iter().map(|(d, _)| *d).collect(),
        })
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    pub fn num_sensors(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of patches per dome.
    pub fn num_patches(&self) -> usize {
        self.num_sky
    }

    /// Integrates the radiance of `sky` and `ground` with the stored weights.
    ///
    /// Contributions are summed in the same order as [`super::evaluate`], so
    /// results match a direct evaluation with the same geometry.
    pub fn apply(
        &self,
        sky: &SkyMatrix,
        ground: &GroundHemisphere,
        mode: EvaluationMode,
    ) -> Result<IrradianceResult> {
        if sky.num_patches() != ground.num_patches() {
            return Err(RadiationError::DomeMismatch {
                sky: sky.num_patches(),
                ground: ground.num_patches(),
            });
        }
        if sky.num_patches() != self.num_sky {
            return Err(RadiationError::config(format!(
                "intersection matrix was computed for {} patches, sky has {}",
                self.num_sky,
                sky.num_patches()
            )));
        }
        let dome = dome_directions(sky, ground)?;
        if let Some(i) = dome
            .iter()
            .zip(&self.directions)
            .position(|((d, _), stored)| !d.is_close(stored))
        {
            return Err(RadiationError::config(format!(
                "intersection matrix was computed for another dome layout (patch {i} differs)"
            )));
        }
        let radiance = dome_radiance(sky, ground);
        let (factor, unit) = mode_factor(mode, sky.duration_hours());

        let values = self
            .weights
            .outer_iter()
            .map(|row| {
                let mut sum = 0.0;
                for (w, l) in row.iter().zip(&radiance) {
                    sum += w * l;
                }
                sum * factor
            })
            .collect();

        Ok(IrradianceResult::new(values, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::mesh::Mesh;
    use crate::sim::radiation::evaluator::evaluate;
    use crate::sim::sky::dome::{SkyDensity, discretize};
    use crate::sim::sky::matrix::SkyPatch;
    use crate::{Point, Vector};

    #[test]
    fn test_matches_direct_evaluation() -> anyhow::Result<()> {
        let wall = Mesh::new(
            vec![
                Point::new(2.0, -5.0, 0.0),
                Point::new(2.0, 5.0, 0.0),
                Point::new(2.0, 5.0, 4.0),
                Point::new(2.0, -5.0, 4.0),
            ],
            vec![vec![0, 1, 2, 3]],
        );
        let scene = ContextScene::new(&wall, None)?;
        let sensors: Vec<SensorPoint> = (0..5)
            .map(|i| {
                SensorPoint::new(
                    Point::new(-(i as f64), 0.0, 0.0),
                    Vector::new(0.3 * i as f64, 0.0, 1.0),
                )
            })
            .collect();
        let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 7.0, 10.0)?;
        let ground = GroundHemisphere::from_sky(&sky, 0.25)?;
        let config = EvaluationConfig::new();

        let matrix = IntersectionMatrix::compute(&sensors, &scene, &sky, &ground, &config, None)?;
        assert_eq!(matrix.weights().dim(), (5, 290));

        let direct = evaluate(&sensors, &scene, &sky, &ground, &config, None)?;
        let applied = matrix.apply(&sky, &ground, config.mode)?;
        assert_eq!(direct, applied);
        Ok(())
    }

    #[test]
    fn test_apply_rejects_other_density() -> anyhow::Result<()> {
        let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 1.0, 1.0)?;
        let ground = GroundHemisphere::from_sky(&sky, 0.2)?;
        let sensors = [SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0))];
        let matrix = IntersectionMatrix::compute(
            &sensors,
            &ContextScene::empty(),
            &sky,
            &ground,
            &EvaluationConfig::new(),
            None,
        )?;
        let high = SkyMatrix::uniform(SkyDensity::high(), 1.0, 1.0)?;
        let high_ground = GroundHemisphere::from_sky(&high, 0.2)?;
        assert!(matrix.apply(&high, &high_ground, EvaluationMode::Cumulative).is_err());
        Ok(())
    }

    #[test]
    fn test_apply_rejects_rotated_dome() -> anyhow::Result<()> {
        let sensors = [SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.6, 0.0, 1.0))];
        let sky = SkyMatrix::from_patches(
            discretize(SkyDensity::Tregenza, 0.0)?
                .into_iter()
                .map(|g| SkyPatch::new(g, 1.0, 2.0))
                .collect(),
            10.0,
        )?;
        let ground = GroundHemisphere::from_sky(&sky, 0.2)?;
        let matrix = IntersectionMatrix::compute(
            &sensors,
            &ContextScene::empty(),
            &sky,
            &ground,
            &EvaluationConfig::new(),
            None,
        )?;
        assert!(matrix.apply(&sky, &ground, EvaluationMode::Cumulative).is_ok());

        let rotated = SkyMatrix::from_patches(
            discretize(SkyDensity::Tregenza, 90.0)?
                .into_iter()
                .map(|g| SkyPatch::new(g, 1.0, 2.0))
                .collect(),
            10.0,
        )?;
        let rotated_ground = GroundHemisphere::from_sky(&rotated, 0.2)?;
        let err = matrix
            .apply(&rotated, &rotated_ground, EvaluationMode::Cumulative)
            .unwrap_err();
        assert!(matches!(err, RadiationError::InvalidConfiguration(_)));
        Ok(())
    }
}
