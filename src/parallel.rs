use std::thread;
use std::time::{ Duration, Instant };
use std::sync::mpsc;
use std::sync::{ Arc, Mutex };
use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };

use log::{ debug, info, warn };

use crate::ray::Ray3D;
use crate::color::Color;
use crate::scene::Scene;
use crate::camera::Camera;
use crate::geometry::HitPolicy;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::canvas::{ Canvas, FrameAssembler, PixelIndex, PixelResult };
use crate::consts::{ CHANNEL_BUFFER_PER_WORKER, CANCEL_POLL_MS };

/// One unit of work: the ray cast through a single pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelTask {
    pub index: PixelIndex,
    pub ray: Ray3D,
}

pub enum Message {
    Pixel(PixelTask),
    Terminate,
}

/// A shared flag for stopping a render early.
///
/// Clones share the same flag. Once cancelled, a token stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A snapshot of render progress, handed to progress callbacks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Everything a worker needs to turn a ray into a color.
#[derive(Copy, Clone, Debug)]
struct Shading {
    policy: HitPolicy,
    background: Color,
}

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, scene: Arc<Scene>, shading: Shading,
        receiver: Arc<Mutex<mpsc::Receiver<Message>>>,
        results: mpsc::SyncSender<PixelResult>, stop: CancelToken,
        completed: Arc<AtomicUsize>) -> Worker {

        let thread = thread::spawn(move || loop {
            if stop.is_cancelled() {
                debug!("Worker {} stopping early", id);
                break;
            }

            // Obtain the next message. The lock is released before the
            // message is handled.
            let message = match receiver.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => break,
            };

            match message {
                Ok(Message::Pixel(task)) => {
                    let color = scene.color_at(
                        &task.ray, shading.policy, shading.background
                    );

                    let result = PixelResult { index: task.index, color };
                    if results.send(result).is_err() {
                        // Nobody is collecting anymore.
                        break;
                    }

                    completed.fetch_add(1, Ordering::Relaxed);
                },

                // Exit the worker thread loop, terminating the thread. A
                // closed task channel means the same thing.
                Ok(Message::Terminate) | Err(_) => break,
            }
        });

        Worker { id, thread: Some(thread) }
    }
}

/// A fixed-size pool of threads casting pixel rays against one scene.
///
/// Tasks go in through `execute`; colors come out, tagged with their pixel,
/// on the result channel given to `new`. Completion order is unspecified.
struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::SyncSender<Message>>,
}

impl ThreadPool {
    fn new(size: usize, scene: Arc<Scene>, shading: Shading,
        results: mpsc::SyncSender<PixelResult>, stop: CancelToken,
        completed: Arc<AtomicUsize>) -> ThreadPool {
        let (sender, receiver) = mpsc::sync_channel(
            size * CHANNEL_BUFFER_PER_WORKER
        );
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            workers.push(Worker::new(
                id,
                Arc::clone(&scene),
                shading,
                Arc::clone(&receiver),
                results.clone(),
                stop.clone(),
                Arc::clone(&completed),
            ));
        }

        ThreadPool { workers, sender: Some(sender) }
    }

    /// Queues a message, blocking while the task buffer is full.
    ///
    /// Fails once every worker has exited.
    fn execute(&self, message: Message) -> Result<(), RenderError> {
        match self.sender {
            Some(ref sender) => sender.send(message)
                .map_err(|_| RenderError::Disconnected),
            None => Err(RenderError::Disconnected),
        }
    }

    /// Tells every worker to exit once the queued tasks are drained.
    fn close(&mut self) {
        if let Some(sender) = self.sender.take() {
            for _ in &self.workers {
                if sender.send(Message::Terminate).is_err() {
                    break;
                }
            }
        }
    }

    /// Waits for every worker to exit.
    fn join(&mut self) -> Result<(), RenderError> {
        self.close();

        let mut panicked = false;
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    warn!("Worker {} panicked", worker.id);
                    panicked = true;
                }
            }
        }

        if panicked {
            Err(RenderError::WorkerPanicked)
        } else {
            Ok(())
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.join();
    }
}

/// Periodically reports how many pixels are done.
struct ProgressMonitor {
    stop: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ProgressMonitor {
    fn start(interval: Duration, total: usize, workers: usize,
        completed: Arc<AtomicUsize>, callback: Option<ProgressCallback>)
        -> ProgressMonitor {
        let (stop, stopped) = mpsc::channel::<()>();
        let start = Instant::now();

        let thread = thread::spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let progress = Progress {
                        completed: completed.load(Ordering::Relaxed),
                        total,
                        workers,
                        elapsed: start.elapsed(),
                    };

                    info!("{}/{} pixels done, {} workers, {:.1?} elapsed",
                        progress.completed, progress.total, progress.workers,
                        progress.elapsed);

                    if let Some(ref callback) = callback {
                        callback(progress);
                    }
                },
                _ => break,
            }
        });

        ProgressMonitor { stop, thread: Some(thread) }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Fans tagged results back into a frame.
///
/// Runs until every pixel has arrived, all workers have gone away, or the
/// render is cancelled. Any integrity failure stops the workers.
fn collect(width: usize, height: usize, results: mpsc::Receiver<PixelResult>,
    cancel: CancelToken, stop: CancelToken) -> Result<Canvas, RenderError> {
    let mut assembler = FrameAssembler::new(width, height);
    let poll = Duration::from_millis(CANCEL_POLL_MS);

    while !assembler.is_complete() {
        if cancel.is_cancelled() || stop.is_cancelled() {
            stop.cancel();
            return Err(RenderError::Cancelled);
        }

        match results.recv_timeout(poll) {
            Ok(result) => {
                if let Err(e) = assembler.accept(result) {
                    stop.cancel();
                    return Err(e);
                }
            },
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    assembler.finish()
}

/// Renders scenes with a pool of worker threads.
///
/// # Examples
///
/// ```
/// # use sphere_caster::config::RenderConfig;
/// # use sphere_caster::parallel::Renderer;
/// # use sphere_caster::scene::Scene;
/// let config = RenderConfig { workers: Some(2), ..RenderConfig::new(16, 8) };
/// let canvas = Renderer::new(config).render(Scene::test_scene()).unwrap();
/// assert_eq!((canvas.width, canvas.height), (16, 8));
/// ```
pub struct Renderer {
    config: RenderConfig,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Renderer {
        Renderer { config, cancel: CancelToken::new(), progress: None }
    }

    /// Uses `cancel` to stop renders from another thread.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Renderer {
        self.cancel = cancel;
        self
    }

    /// Calls `callback` every `progress_interval_ms` while rendering. Has no
    /// effect when the configuration sets no interval.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Renderer
        where F: Fn(Progress) + Send + Sync + 'static {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Renders one frame of `scene`.
    ///
    /// Returns a canvas with a color for every pixel, or an error; a
    /// partially rendered frame is never returned.
    pub fn render<S: Into<Arc<Scene>>>(&self, scene: S)
        -> Result<Canvas, RenderError> {
        self.config.validate()?;

        let scene: Arc<Scene> = scene.into();
        let width = self.config.width;
        let height = self.config.height;
        let workers = self.config.worker_count();
        let camera = Camera::new(width, height, self.config.field_of_view);
        let shading = Shading {
            policy: self.config.hit_policy,
            background: self.config.background,
        };

        info!("Rendering {}x{} frame of {} spheres using {} threads...",
            width, height, scene.len(), workers);
        let start = Instant::now();

        let stop = CancelToken::new();
        let completed = Arc::new(AtomicUsize::new(0));
        let (results, collected) = mpsc::sync_channel(
            workers * CHANNEL_BUFFER_PER_WORKER
        );

        let mut thread_pool = ThreadPool::new(
            workers, scene, shading, results, stop.clone(),
            Arc::clone(&completed)
        );

        let collector = {
            let cancel = self.cancel.clone();
            let stop = stop.clone();
            thread::spawn(move || collect(width, height, collected, cancel, stop))
        };

        let _monitor = self.config.progress_interval().map(|interval| {
            ProgressMonitor::start(interval, width * height, workers,
                Arc::clone(&completed), self.progress.clone())
        });

        for (index, ray) in camera.rays() {
            if self.cancel.is_cancelled() || stop.is_cancelled() {
                stop.cancel();
                break;
            }

            if thread_pool.execute(Message::Pixel(PixelTask { index, ray }))
                .is_err() {
                break;
            }
        }
        thread_pool.close();

        let assembled = collector.join()
            .unwrap_or(Err(RenderError::WorkerPanicked));
        if assembled.is_err() {
            stop.cancel();
        }

        let joined = thread_pool.join();
        let canvas = match (assembled, joined) {
            (Ok(canvas), _) => canvas,
            (Err(RenderError::Cancelled), _) => return Err(RenderError::Cancelled),
            (Err(_), Err(e)) => return Err(e),
            (Err(e), Ok(())) => return Err(e),
        };

        info!("...done in {:.2?}.", start.elapsed());
        Ok(canvas)
    }
}

/// Renders `scene` into a `width`-by-`height` canvas with default settings.
pub fn render(width: usize, height: usize, scene: &Scene)
    -> Result<Canvas, RenderError> {
    Renderer::new(RenderConfig::new(width, height)).render(scene.clone())
}

/* Tests */

#[cfg(test)]
use crate::geometry::Sphere;
#[cfg(test)]
use crate::vector::Vector3D;

#[cfg(test)]
fn config(width: usize, height: usize, workers: usize) -> RenderConfig {
    RenderConfig { workers: Some(workers), ..RenderConfig::new(width, height) }
}

#[test]
fn empty_scene_renders_background() {
    let canvas = Renderer::new(config(7, 5, 3)).render(Scene::empty()).unwrap();

    assert_eq!((canvas.width, canvas.height), (7, 5));
    assert!(canvas.pixels().iter().all(|&c| c == Color::background()));
}

#[test]
fn configured_background_is_used() {
    let config = RenderConfig {
        background: Color::white(),
        ..config(4, 4, 2)
    };
    let canvas = Renderer::new(config).render(Scene::empty()).unwrap();

    assert!(canvas.pixels().iter().all(|&c| c == Color::white()));
}

#[test]
fn matches_sequential_render() {
    let scene = Scene::random(40, 64.0, 6.0, 1234);
    let c = config(48, 32, 4);
    let canvas = Renderer::new(c.clone()).render(scene.clone()).unwrap();

    let camera = Camera::new(48, 32, c.field_of_view);
    for (index, ray) in camera.rays() {
        let expected = scene.color_at(&ray, c.hit_policy, c.background);
        assert_eq!(canvas.read_pixel(index.x, index.y), Some(expected),
            "pixel {} differs", index);
    }
}

#[test]
fn worker_count_does_not_change_output() {
    let scene = Scene::random(60, 80.0, 8.0, 99);
    let one = Renderer::new(config(40, 25, 1)).render(scene.clone()).unwrap();
    let many = Renderer::new(config(40, 25, 8)).render(scene).unwrap();

    assert_eq!(one, many);
}

#[test]
fn single_pixel_frame() {
    let scene = Scene::new(vec![
        Sphere::new(Vector3D::zero(), 5.0, Color::red())
    ]);
    let canvas = Renderer::new(config(1, 1, 4)).render(scene).unwrap();

    assert_eq!(canvas.read_pixel(0, 0), Some(Color::red()));
}

#[test]
fn invalid_config_is_rejected() {
    match Renderer::new(config(0, 4, 1)).render(Scene::empty()) {
        Err(RenderError::InvalidConfig(_)) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn cancelled_render_returns_nothing() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let renderer = Renderer::new(config(64, 64, 2))
        .with_cancel_token(cancel);

    match renderer.render(Scene::test_scene()) {
        Err(RenderError::Cancelled) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn progress_callback_is_called() {
    let calls = Arc::new(AtomicUsize::new(0));
    let last_total = Arc::new(AtomicUsize::new(0));
    let overshoot = Arc::new(AtomicBool::new(false));

    let config = RenderConfig {
        progress_interval_ms: Some(1),
        ..config(400, 300, 2)
    };
    let scene = Scene::random(200, 400.0, 10.0, 5);

    let (c, t, o) = (calls.clone(), last_total.clone(), overshoot.clone());
    let canvas = Renderer::new(config)
        .with_progress_callback(move |p| {
            c.fetch_add(1, Ordering::SeqCst);
            t.store(p.total, Ordering::SeqCst);
            if p.completed > p.total {
                o.store(true, Ordering::SeqCst);
            }
        })
        .render(scene);

    assert!(canvas.is_ok());
    assert!(!overshoot.load(Ordering::SeqCst));
    // The callback fires on a timer, so a fast machine may finish first.
    if calls.load(Ordering::SeqCst) > 0 {
        assert_eq!(last_total.load(Ordering::SeqCst), 400 * 300);
    }
}

#[test]
fn free_render_function() {
    let canvas = render(10, 6, &Scene::test_scene()).unwrap();

    assert_eq!(canvas.pixels().len(), 60);
}
