use std::fs;
use std::path::{ Path, PathBuf };
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;

use sphere_caster::config::RenderConfig;
use sphere_caster::geometry::HitPolicy;
use sphere_caster::parallel::Renderer;
use sphere_caster::scene::{ Scene, SceneDescription, time_seed };
use sphere_caster::sink::{ sink_for_path, timestamped_path };
use sphere_caster::consts::{ DEFAULT_OUT_DIR, RANDOM_SPHERE_RADIUS };

/// Casts one ray per pixel into a scene of spheres and saves the image.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON scene file. Render settings in the file are used unless
    /// overridden below.
    #[clap(long, value_name = "FILE", conflicts_with = "random")]
    scene: Option<PathBuf>,

    /// Render COUNT randomly placed spheres instead of a scene file.
    #[clap(long, value_name = "COUNT")]
    random: Option<usize>,

    /// Seed for --random. Defaults to the current time.
    #[clap(long, requires = "random")]
    seed: Option<u64>,

    /// Image width in pixels.
    #[clap(long)]
    width: Option<usize>,

    /// Image height in pixels.
    #[clap(long)]
    height: Option<usize>,

    /// Number of worker threads. Defaults to one per logical core.
    #[clap(long)]
    workers: Option<usize>,

    /// Ignore intersections behind the camera.
    #[clap(long)]
    forward_only: bool,

    /// Log progress every MS milliseconds.
    #[clap(long, value_name = "MS")]
    progress_ms: Option<u64>,

    /// Output image (.png or .ppm). Defaults to a timestamped PNG in "out/".
    #[clap(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();

    // Scene and file-level settings
    let (scene, mut config) = match args.scene {
        Some(ref path) => {
            let description = SceneDescription::from_json_file(path)
                .with_context(|| format!("loading scene {}", path.display()))?;
            (description.scene, description.render.unwrap_or_default())
        },
        None => (Scene::test_scene(), RenderConfig::default()),
    };

    // Command line overrides
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.forward_only {
        config.hit_policy = HitPolicy::Forward;
    }
    if args.progress_ms.is_some() {
        config.progress_interval_ms = args.progress_ms;
    }

    let scene = match args.random {
        Some(count) => {
            let seed = args.seed.unwrap_or_else(time_seed);
            Scene::random(count, config.width as f64, RANDOM_SPHERE_RADIUS, seed)
        },
        None => scene,
    };

    let output = match args.output {
        Some(path) => path,
        None => timestamped_path(Path::new(DEFAULT_OUT_DIR), time_seed()),
    };
    let sink = sink_for_path(&output)?;

    let start = Instant::now();
    let canvas = Renderer::new(config).render(scene).context("rendering frame")?;
    info!("RENDER TIME: {:.2?}", start.elapsed());

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    sink.save_canvas(&output, &canvas)
        .with_context(|| format!("saving {}", output.display()))?;

    Ok(())
}
