use std::fs;
use std::path::Path;
use std::time::{ SystemTime, UNIX_EPOCH };

use log::{ debug, info };
use rand::{ Rng, SeedableRng };
use rand::rngs::StdRng;
use serde::{ Serialize, Deserialize };

use crate::vector::Vector3D;
use crate::color::Color;
use crate::ray::Ray3D;
use crate::geometry::{ Sphere, HitPolicy, solve };
use crate::config::RenderConfig;
use crate::error::SceneError;

/// A collection of spheres to render.
///
/// The scene is never modified while a frame renders; every worker reads
/// the same spheres.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
}

impl Scene {
    pub fn new(spheres: Vec<Sphere>) -> Scene {
        Scene { spheres }
    }

    /// Creates a scene with no spheres. Every pixel renders as background.
    pub fn empty() -> Scene {
        Default::default()
    }

    /// Three overlapping spheres (red, blue and green), each of radius 200.
    pub fn test_scene() -> Scene {
        Scene::new(vec![
            Sphere::new(Vector3D::new(100.0, 70.0, 0.0), 200.0, Color::red()),
            Sphere::new(Vector3D::new(70.0, -70.0, 0.0), 200.0, Color::blue()),
            Sphere::new(Vector3D::new(70.0, 70.0, -70.0), 200.0, Color::green()),
        ])
    }

    /// Populates a scene with `count` spheres of random color at random
    /// positions.
    ///
    /// Each center coordinate is drawn uniformly from
    /// `[-extent / 2, extent / 2)`, and each color channel from `0..255`.
    /// The same seed always yields the same scene.
    pub fn random(count: usize, extent: f64, radius: f64, seed: u64) -> Scene {
        info!("Generating {} random spheres with seed {}", count, seed);

        let mut rng = StdRng::seed_from_u64(seed);
        let half = extent / 2.0;

        let mut spheres = Vec::with_capacity(count);
        for _ in 0..count {
            let origin = Vector3D::new(
                rng.gen::<f64>() * extent - half,
                rng.gen::<f64>() * extent - half,
                rng.gen::<f64>() * extent - half,
            );

            let color = Color::rgb(
                rng.gen_range(0..255),
                rng.gen_range(0..255),
                rng.gen_range(0..255),
            );

            spheres.push(Sphere::new(origin, radius, color));
        }

        Scene { spheres }
    }

    /// Checks every sphere, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), SceneError> {
        match self.spheres.iter().position(|s| !s.is_valid()) {
            Some(index) => Err(SceneError::InvalidSphere { index }),
            None => Ok(()),
        }
    }

    /// The color seen along a ray: the nearest sphere's color, or
    /// `background` if the ray hits nothing.
    pub fn color_at(&self, ray: &Ray3D, policy: HitPolicy, background: Color)
        -> Color {
        match solve(ray, &self.spheres, policy) {
            Some(hit) if hit.distance.is_finite() => hit.sphere.color,
            _ => background,
        }
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}

/// A seed derived from the current time, for scenes which should differ
/// from run to run.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A scene loaded from a file, with any render settings the file carries.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescription {
    pub scene: Scene,
    pub render: Option<RenderConfig>,
}

impl From<SceneJson> for SceneDescription {
    fn from(scene_json: SceneJson) -> SceneDescription {
        let spheres = scene_json.spheres.into_iter()
            .map(|x| x.into())
            .collect();

        SceneDescription {
            scene: Scene { spheres },
            render: scene_json.render,
        }
    }
}

impl SceneDescription {
    /// Parses and validates a JSON scene description.
    pub fn from_json_str(json: &str) -> Result<SceneDescription, SceneError> {
        let scene_json: SceneJson = serde_json::from_str(json)?;
        let description: SceneDescription = scene_json.into();
        description.scene.validate()?;

        debug!("Parsed scene with {} spheres", description.scene.len());
        Ok(description)
    }

    /// Reads, parses and validates a JSON scene file.
    pub fn from_json_file(path: &Path) -> Result<SceneDescription, SceneError> {
        let json = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loading scene from {}", path.display());
        SceneDescription::from_json_str(&json)
    }
}

#[derive(Serialize, Deserialize)]
pub struct SceneJson {
    #[serde(default)]
    render: Option<RenderConfig>,
    spheres: Vec<SphereJson>,
}

#[derive(Clone, Serialize, Deserialize)]
struct SphereJson {
    origin: Vec<f64>,
    radius: f64,
    color: Color,
}

impl From<SphereJson> for Sphere {
    fn from(sphere_json: SphereJson) -> Sphere {
        Sphere::new(
            sphere_json.origin.as_slice().into(),
            sphere_json.radius,
            sphere_json.color,
        )
    }
}

#[test]
fn test_scene_has_three_spheres() {
    let s = Scene::test_scene();

    assert_eq!(s.len(), 3);
    assert!(s.validate().is_ok());
}

#[test]
fn empty_scene_is_background() {
    let s = Scene::empty();
    let r = Ray3D::new(Vector3D::zero(), Vector3D::new(1.0, 0.0, 0.0));

    assert_eq!(s.color_at(&r, HitPolicy::Unrestricted, Color::background()),
        Color::background());
    assert_eq!(s.color_at(&r, HitPolicy::Unrestricted, Color::white()),
        Color::white());
}

#[test]
fn color_at_uses_nearest_sphere() {
    let s = Scene::new(vec![
        Sphere::new(Vector3D::new(-5.0, 0.0, 0.0), 1.0, Color::blue()),
        Sphere::new(Vector3D::new(-2.0, 0.0, 0.0), 1.0, Color::red()),
    ]);
    let r = Ray3D::new(Vector3D::new(5.0, 0.0, 0.0),
                       Vector3D::new(-1.0, 0.0, 0.0));

    assert_eq!(s.color_at(&r, HitPolicy::Forward, Color::background()),
        Color::red());
}

#[test]
fn random_scene_is_reproducible() {
    let a = Scene::random(50, 256.0, 10.0, 42);
    let b = Scene::random(50, 256.0, 10.0, 42);
    let c = Scene::random(50, 256.0, 10.0, 43);

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn random_scene_stays_in_bounds() {
    let s = Scene::random(200, 100.0, 10.0, 7);

    assert_eq!(s.len(), 200);
    for sphere in s.spheres.iter() {
        assert!(sphere.origin.x >= -50.0 && sphere.origin.x < 50.0);
        assert!(sphere.origin.y >= -50.0 && sphere.origin.y < 50.0);
        assert!(sphere.origin.z >= -50.0 && sphere.origin.z < 50.0);
        assert_eq!(sphere.radius, 10.0);
        assert!(sphere.color.r < 255 && sphere.color.g < 255 && sphere.color.b < 255);
    }
}

#[test]
fn scene_from_json() {
    let d = SceneDescription::from_json_str(r#"{
        "spheres": [
            { "origin": [1.0, 2.0, 3.0], "radius": 4.0, "color": [255, 0, 0] }
        ]
    }"#).unwrap();

    assert_eq!(d.render, None);
    assert_eq!(d.scene.spheres, vec![
        Sphere::new(Vector3D::new(1.0, 2.0, 3.0), 4.0, Color::red())
    ]);
}

#[test]
fn scene_from_json_with_render_settings() {
    let d = SceneDescription::from_json_str(r#"{
        "render": { "width": 64, "height": 32 },
        "spheres": []
    }"#).unwrap();

    let render = d.render.unwrap();
    assert_eq!((render.width, render.height), (64, 32));
    assert!(d.scene.is_empty());
}

#[test]
fn scene_json_rejects_bad_radius() {
    let result = SceneDescription::from_json_str(r#"{
        "spheres": [
            { "origin": [0.0, 0.0, 0.0], "radius": 1.0, "color": [0, 0, 0] },
            { "origin": [0.0, 0.0, 0.0], "radius": -1.0, "color": [0, 0, 0] }
        ]
    }"#);

    match result {
        Err(SceneError::InvalidSphere { index }) => assert_eq!(index, 1),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn scene_json_rejects_malformed_input() {
    match SceneDescription::from_json_str("{ \"spheres\": 3 }") {
        Err(SceneError::Json(_)) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn missing_scene_file() {
    let path = Path::new("/nonexistent/scene.json");

    match SceneDescription::from_json_file(path) {
        Err(SceneError::Io { .. }) => {},
        other => panic!("unexpected result {:?}", other),
    }
}
