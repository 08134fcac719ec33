use sphere_caster::camera::Camera;
use sphere_caster::color::Color;
use sphere_caster::config::RenderConfig;
use sphere_caster::geometry::{ HitPolicy, Sphere };
use sphere_caster::parallel::Renderer;
use sphere_caster::ray::Ray3D;
use sphere_caster::scene::Scene;
use sphere_caster::vector::Vector3D;
use sphere_caster::render;

fn config(width: usize, height: usize, workers: usize) -> RenderConfig {
    RenderConfig { workers: Some(workers), ..RenderConfig::new(width, height) }
}

/// Distance from `center` to the infinite line along `ray`.
fn line_distance(ray: &Ray3D, center: Vector3D) -> f64 {
    (center - ray.origin).cross(&ray.direction).length() / ray.direction.length()
}

#[test]
fn empty_scene_is_all_background() {
    let canvas = render(31, 17, &Scene::empty()).unwrap();

    assert_eq!(canvas.pixels().len(), 31 * 17);
    assert!(canvas.pixels().iter().all(|&c| c == Color::background()));
}

#[test]
fn single_sphere_covers_exactly_its_pixels() {
    let center = Vector3D::new(-50.0, 3.0, -4.0);
    let radius = 10.0;
    let scene = Scene::new(vec![Sphere::new(center, radius, Color::red())]);

    let canvas = Renderer::new(config(32, 24, 3)).render(scene).unwrap();
    let camera = Camera::new(32, 24, RenderConfig::default().field_of_view);

    let mut hits = 0;
    for (index, ray) in camera.rays() {
        let distance = line_distance(&ray, center);
        if (distance - radius).abs() < 1e-6 {
            continue;
        }

        let expected = if distance < radius {
            hits += 1;
            Color::red()
        } else {
            Color::background()
        };
        assert_eq!(canvas.read_pixel(index.x, index.y), Some(expected),
            "pixel {}", index);
    }

    assert!(hits > 0);
}

#[test]
fn disjoint_spheres_never_mix() {
    let left = Vector3D::new(-50.0, -12.0, 0.0);
    let right = Vector3D::new(-50.0, 12.0, 0.0);
    let scene = Scene::new(vec![
        Sphere::new(left, 5.0, Color::red()),
        Sphere::new(right, 5.0, Color::blue()),
    ]);

    let canvas = Renderer::new(config(40, 40, 4)).render(scene).unwrap();
    let camera = Camera::new(40, 40, RenderConfig::default().field_of_view);

    let (mut reds, mut blues) = (0, 0);
    for (index, ray) in camera.rays() {
        let color = canvas.read_pixel(index.x, index.y).unwrap();
        let in_left = line_distance(&ray, left) < 5.0;
        let in_right = line_distance(&ray, right) < 5.0;
        assert!(!(in_left && in_right));

        if color == Color::red() {
            reds += 1;
            assert!(!in_right, "pixel {}", index);
        } else if color == Color::blue() {
            blues += 1;
            assert!(!in_left, "pixel {}", index);
        } else {
            assert_eq!(color, Color::background());
        }
    }

    assert!(reds > 0 && blues > 0);
}

#[test]
fn repeated_renders_are_identical() {
    let scene = Scene::test_scene();

    let first = Renderer::new(config(256, 256, 8)).render(scene.clone()).unwrap();
    let second = Renderer::new(config(256, 256, 3)).render(scene).unwrap();

    assert_eq!(first.to_rgba(), second.to_rgba());
}

#[test]
fn non_square_frames_keep_pixel_identity() {
    let scene = Scene::random(300, 200.0, 10.0, 2024);
    let c = config(97, 41, 5);

    let canvas = Renderer::new(c.clone()).render(scene.clone()).unwrap();
    let again = Renderer::new(c.clone()).render(scene.clone()).unwrap();
    assert_eq!(canvas, again);

    let camera = Camera::new(97, 41, c.field_of_view);
    for (index, ray) in camera.rays() {
        assert_eq!(canvas.read_pixel(index.x, index.y),
            Some(scene.color_at(&ray, c.hit_policy, c.background)));
    }
}

#[test]
fn three_sphere_center_pixel() {
    let scene = Scene::test_scene();

    // The camera sits inside all three spheres. Counting hits behind the
    // camera, the green sphere's far side is closest.
    let canvas = Renderer::new(config(256, 256, 4)).render(scene.clone()).unwrap();
    assert_eq!(canvas.read_pixel(128, 128), Some(Color::green()));

    let forward = RenderConfig {
        hit_policy: HitPolicy::Forward,
        ..config(256, 256, 4)
    };
    let canvas = Renderer::new(forward).render(scene).unwrap();
    assert_eq!(canvas.read_pixel(128, 128), Some(Color::red()));
}

#[test]
fn rgba_buffer_is_opaque_and_row_major() {
    let scene = Scene::new(vec![
        Sphere::new(Vector3D::new(-40.0, 6.0, 0.0), 3.0, Color::green()),
    ]);
    let canvas = render(20, 10, &scene).unwrap();
    let rgba = canvas.to_rgba();

    assert_eq!(rgba.len(), 20 * 10 * 4);
    for y in 0..10 {
        for x in 0..20 {
            let o = 4 * (y * 20 + x);
            let c = canvas.read_pixel(x, y).unwrap();
            assert_eq!(&rgba[o..o + 4], &[c.r, c.g, c.b, 255]);
        }
    }
}

#[test]
fn bundled_scene_file_loads() {
    use std::path::Path;
    use sphere_caster::scene::SceneDescription;

    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenes/three_spheres.json");
    let description = SceneDescription::from_json_file(&path).unwrap();

    assert_eq!(description.scene, Scene::test_scene());
    let render = description.render.unwrap();
    assert_eq!((render.width, render.height), (256, 256));
    assert_eq!(render.hit_policy, HitPolicy::Unrestricted);
}
