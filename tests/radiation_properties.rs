use std::f64::consts::PI;

use anyhow::Result;
use rand::Rng;

use incident_radiation::sim::sky::matrix::SkyPatch;
use incident_radiation::{
    AnalysisPeriod, ContextScene, EvaluationConfig, GroundHemisphere, Location, Mesh, Point,
    RadiationError, RadiationStudy, SensorGrid, SensorPoint, SkyConfig, SkyDensity, SkyMatrix,
    SkySource, StudyConfig, Vector, WeatherSeries, evaluate,
};

fn sensor(normal: Vector) -> SensorPoint {
    SensorPoint::new(Point::new(0.0, 0.0, 0.0), normal)
}

fn single_patch_sky(direction: Vector, duration_hours: f64) -> Result<SkyMatrix> {
    let patch = SkyPatch::custom(direction, 1.0, 100.0);
    Ok(SkyMatrix::from_patches(vec![patch], duration_hours)?)
}

fn run_single(
    sensors: &[SensorPoint],
    scene: &ContextScene,
    sky: &SkyMatrix,
    ground: &GroundHemisphere,
) -> Result<Vec<f64>> {
    let result = evaluate(sensors, scene, sky, ground, &EvaluationConfig::new(), None)?;
    Ok(result.into_values())
}

#[test]
fn overhead_patch_gives_radiance_times_period() -> Result<()> {
    let period = 250.0;
    let sky = single_patch_sky(Vector::new(0.0, 0.0, 1.0), period)?;
    let ground = GroundHemisphere::from_sky(&sky, 0.0)?;
    let values = run_single(
        &[sensor(Vector::new(0.0, 0.0, 1.0))],
        &ContextScene::empty(),
        &sky,
        &ground,
    )?;
    assert!((values[0] - 100.0 * period).abs() < 1e-9);
    Ok(())
}

#[test]
fn grazing_patch_contributes_nothing() -> Result<()> {
    let sky = single_patch_sky(Vector::new(1.0, 0.0, 0.0), 10.0)?;
    let ground = GroundHemisphere::from_sky(&sky, 0.0)?;
    let values = run_single(
        &[sensor(Vector::new(0.0, 0.0, 1.0))],
        &ContextScene::empty(),
        &sky,
        &ground,
    )?;
    assert!(values[0].abs() < 1e-9);
    Ok(())
}

#[test]
fn downward_sensor_without_ground_sees_nothing() -> Result<()> {
    let location = Location::new("Test", 40.0, -3.7, 1.0, 600.0);
    let source = SkySource::Measured(WeatherSeries::synthetic(location, 900.0));
    let sky = SkyMatrix::build(&source, &SkyConfig::default(), &AnalysisPeriod::annual())?;
    let ground = GroundHemisphere::from_sky(&sky, 0.0)?;
    let values = run_single(
        &[sensor(Vector::new(0.0, 0.0, -1.0))],
        &ContextScene::empty(),
        &sky,
        &ground,
    )?;
    assert_eq!(values[0], 0.0);
    Ok(())
}

#[test]
fn uniform_sky_matches_closed_form() -> Result<()> {
    let radiance = 42.0;
    let duration = 8760.0;
    for density in [SkyDensity::Tregenza, SkyDensity::high()] {
        let sky = SkyMatrix::uniform(density, radiance, duration)?;
        let ground = GroundHemisphere::from_sky(&sky, 0.0)?;
        let values = run_single(
            &[sensor(Vector::new(0.0, 0.0, 1.0))],
            &ContextScene::empty(),
            &sky,
            &ground,
        )?;
        let expected = PI * radiance * duration;
        assert!(
            (values[0] - expected).abs() / expected < 1e-6,
            "{density:?}: {} vs {expected}",
            values[0]
        );
    }
    Ok(())
}

#[test]
fn ground_contribution_is_linear_in_reflectance() -> Result<()> {
    let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 10.0, 1.0)?;
    let down = [sensor(Vector::new(0.0, 0.0, -1.0))];
    let mut previous: Option<(f64, f64)> = None;
    for r in [0.1, 0.2, 0.4, 0.8] {
        let ground = GroundHemisphere::from_sky(&sky, r)?;
        let v = run_single(&down, &ContextScene::empty(), &sky, &ground)?[0];
        // Looking straight down at a uniform Lambertian ground: E = ρ·E_sky
        assert!((v - r * PI * 10.0).abs() < 1e-6 * v);
        if let Some((prev_r, prev_v)) = previous {
            let ratio: f64 = v / prev_v;
            assert!((ratio - r / prev_r).abs() < 1e-9);
        }
        previous = Some((r, v));
    }
    Ok(())
}

#[test]
fn pipeline_is_bit_identical() -> Result<()> {
    let location = Location::new("Test", 52.2, 21.0, 1.0, 100.0);
    let source = SkySource::Measured(WeatherSeries::synthetic(location, 850.0));
    let context = Mesh::new(
        vec![
            Point::new(3.0, -4.0, 0.0),
            Point::new(3.0, 4.0, 0.0),
            Point::new(3.0, 4.0, 6.0),
            Point::new(3.0, -4.0, 6.0),
        ],
        vec![vec![0, 1, 2, 3]],
    );
    let sensors: Vec<SensorPoint> = (0..12)
        .map(|i| {
            SensorPoint::new(
                Point::new(-0.5 * i as f64, 0.0, 0.0),
                Vector::new(0.2, 0.0, 1.0),
            )
        })
        .collect();
    let grids = [SensorGrid::new("grid", sensors)];

    let mut config = StudyConfig::new();
    config.evaluation.num_threads = Some(3);
    let a = RadiationStudy::new(config.clone()).run(&source, &grids, &context)?;
    let b = RadiationStudy::new(config).run(&source, &grids, &context)?;
    assert_eq!(a.sky, b.sky);
    assert_eq!(a.result.values(), b.result.values());
    assert!(a.result.values().iter().all(|v| v.is_finite() && *v >= 0.0));
    Ok(())
}

fn random_triangles(rng: &mut impl Rng, n: usize) -> Mesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    while faces.len() < n {
        let c = Point::new(
            rng.gen_range(-6.0..6.0),
            rng.gen_range(-6.0..6.0),
            rng.gen_range(0.5..6.0),
        );
        let tri: Vec<Point> = (0..3)
            .map(|_| {
                c + Vector::new(
                    rng.gen_range(-2.0..2.0),
                    rng.gen_range(-2.0..2.0),
                    rng.gen_range(-2.0..2.0),
                )
            })
            .collect();
        let area = 0.5 * (tri[1] - tri[0]).cross(tri[2] - tri[0]).length();
        if area < 1e-3 {
            continue;
        }
        let start = vertices.len();
        vertices.extend(tri);
        faces.push(vec![start, start + 1, start + 2]);
    }
    Mesh::new(vertices, faces)
}

#[test]
fn adding_context_never_increases_irradiance() -> Result<()> {
    let mut rng = rand::thread_rng();
    let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 5.0, 100.0)?;
    let ground = GroundHemisphere::from_sky(&sky, 0.3)?;
    let sensors: Vec<SensorPoint> = (0..8)
        .map(|i| {
            let a = i as f64 * PI / 4.0;
            SensorPoint::new(
                Point::new(a.cos(), a.sin(), 0.0),
                Vector::new(0.5 * a.cos(), 0.5 * a.sin(), 1.0),
            )
        })
        .collect();

    let mut previous = run_single(&sensors, &ContextScene::empty(), &sky, &ground)?;
    let mut context = Mesh::default();
    for _ in 0..5 {
        context.join(&random_triangles(&mut rng, 6));
        let scene = ContextScene::new(&context, None)?;
        let values = run_single(&sensors, &scene, &sky, &ground)?;
        for (now, before) in values.iter().zip(&previous) {
            assert!(now <= before, "{now} > {before}");
        }
        previous = values;
    }
    Ok(())
}

#[test]
fn too_few_patches_is_rejected_before_evaluation() -> Result<()> {
    let location = Location::new("Test", 40.0, 0.0, 0.0, 0.0);
    let source = SkySource::Measured(WeatherSeries::synthetic(location, 900.0));
    let config = SkyConfig {
        min_patches: 500,
        ..SkyConfig::default()
    };
    let err = SkyMatrix::build(&source, &config, &AnalysisPeriod::annual()).unwrap_err();
    assert!(matches!(err, RadiationError::InvalidConfiguration(_)));

    let mut study_config = StudyConfig::new();
    study_config.sky = config;
    let mut study = RadiationStudy::new(study_config);
    let grids = [SensorGrid::new("g", vec![sensor(Vector::new(0.0, 0.0, 1.0))])];
    let err = study.run(&source, &grids, &Mesh::default()).unwrap_err();
    assert!(matches!(err, RadiationError::InvalidConfiguration(_)));
    Ok(())
}

#[test]
fn malformed_sensor_is_reported_with_index() -> Result<()> {
    let sky = SkyMatrix::uniform(SkyDensity::Tregenza, 1.0, 1.0)?;
    let ground = GroundHemisphere::from_sky(&sky, 0.2)?;
    let sensors = [
        sensor(Vector::new(0.0, 0.0, 1.0)),
        sensor(Vector::new(0.0, 0.0, 0.0)),
    ];
    let err = evaluate(
        &sensors,
        &ContextScene::empty(),
        &sky,
        &ground,
        &EvaluationConfig::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RadiationError::MalformedGeometry { index: 1, .. }
    ));
    Ok(())
}
