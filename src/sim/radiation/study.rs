use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::geom::mesh::Mesh;
use crate::sim::engine::ContextScene;
use crate::sim::ground::GroundHemisphere;
use crate::sim::sky::matrix::{SkyMatrix, SkySource};

use super::config::StudyConfig;
use super::evaluator::{CancellationToken, evaluate};
use super::result::{IrradianceResult, ResultSummary};
use super::sensor::{GridInfo, SensorGrid, join_grids};

/// Stage of a study run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    BuildingDomes,
    Evaluating,
    Done,
    Failed,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct StudyOutput {
    pub run_id: Uuid,
    pub sky: SkyMatrix,
    pub ground: GroundHemisphere,
    pub result: IrradianceResult,
    pub grids: Vec<GridInfo>,
    pub summary: ResultSummary,
}

/// Drives the sky builder, the ground model and the evaluator for one run.
pub struct RadiationStudy {
    config: StudyConfig,
    run_id: Uuid,
    stage: Stage,
    cancel: CancellationToken,
}

impl RadiationStudy {
    pub fn new(config: StudyConfig) -> Self {
        Self {
            config,
            run_id: Uuid::new_v4(),
            stage: Stage::Idle,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Token that stops the evaluation when cancelled from another thread.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the study. Any error moves the study to `Failed`; there are no
    /// retries.
    pub fn run(
        &mut self,
        source: &SkySource,
        grids: &[SensorGrid],
        context: &Mesh,
    ) -> Result<StudyOutput> {
        let span = info_span!("study", run_id = %self.run_id);
        let _enter = span.enter();

        let outcome = self.run_stages(source, grids, context);
        match &outcome {
            Ok(output) => {
                self.stage = Stage::Done;
                info!(
                    sensors = output.result.len(),
                    unit = %output.result.unit(),
                    mean = ?output.summary.mean,
                    "Study finished"
                );
            }
            Err(e) => {
                self.stage = Stage::Failed;
                warn!(error = %e, "Study failed");
            }
        }
        outcome
    }

    fn run_stages(
        &mut self,
        source: &SkySource,
        grids: &[SensorGrid],
        context: &Mesh,
    ) -> Result<StudyOutput> {
        self.stage = Stage::BuildingDomes;
        info!(
            period = %self.config.period,
            density = ?self.config.sky.density,
            "Building sky and ground domes"
        );
        let sky = SkyMatrix::build(source, &self.config.sky, &self.config.period)?;
        let ground = GroundHemisphere::from_sky(&sky, self.config.reflectance)?;

        self.stage = Stage::Evaluating;
        let (sensors, grid_infos) = join_grids(grids);
        info!(
            sensors = sensors.len(),
            grids = grid_infos.len(),
            context_faces = context.num_faces(),
            "Evaluating sensors"
        );
        let scene = if context.is_empty() {
            ContextScene::empty()
        } else {
            ContextScene::new(context, self.config.evaluation.voxel_size)?
        };
        let result = evaluate(
            &sensors,
            &scene,
            &sky,
            &ground,
            &self.config.evaluation,
            Some(&self.cancel),
        )?;

        let summary = ResultSummary::new(
            &self.run_id.to_string(),
            &result,
            &sensors,
            sky.duration_hours(),
        );

        Ok(StudyOutput {
            run_id: self.run_id,
            sky,
            ground,
            result,
            grids: grid_infos,
            summary,
        })
    }
}
