use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use anyhow::{Context, Result};
use crossbeam_channel::{self as xchan, Receiver};
use notify::RecommendedWatcher;
use tracing::{debug, error, info, trace, warn};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::config::Configuration;
use crate::events::LoaderEvent;
use crate::grid::PhotoGrid;
use crate::render::gpu::{GpuContext, GpuTexture, GridRenderer, WgpuPainter};
use crate::tasks::{loader::spawn_loader, watch::start_watcher};
use crate::widget::{InputEvent, Key, Widget};

#[derive(Debug)]
enum ViewerEvent {
    /// The loader queued something; `about_to_wait` drains it.
    LoaderReady,
}

struct LoaderLink {
    events: Receiver<LoaderEvent>,
    _watcher: Option<RecommendedWatcher>,
    _thread: JoinHandle<()>,
}

struct GridViewer {
    cfg: Configuration,
    photos: Vec<PathBuf>,
    proxy: EventLoopProxy<ViewerEvent>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<GridRenderer>,
    grid: Option<PhotoGrid<GpuTexture>>,
    loader: Option<LoaderLink>,
}

fn widget(grid: &mut PhotoGrid<GpuTexture>) -> &mut dyn Widget<WgpuPainter> {
    grid
}

impl GridViewer {
    fn new(cfg: Configuration, photos: Vec<PathBuf>, proxy: EventLoopProxy<ViewerEvent>) -> Self {
        Self {
            cfg,
            photos,
            proxy,
            window: None,
            gpu: None,
            renderer: None,
            grid: None,
            loader: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        let attrs = WindowAttributes::default()
            .with_title("Photo Grid")
            .with_inner_size(PhysicalSize::new(self.cfg.width, self.cfg.height))
            .with_resizable(false);
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                if self.cfg.fullscreen {
                    window.set_fullscreen(Some(Fullscreen::Borderless(window.current_monitor())));
                    window.set_cursor_visible(false);
                    info!("window fullscreen initialized");
                }
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create grid window");
                None
            }
        }
    }

    fn init(&mut self, window: Arc<Window>) -> Result<()> {
        let gpu = GpuContext::new(window)?;
        let renderer = GridRenderer::new(&gpu);
        let mut grid = PhotoGrid::from_config(&self.cfg);
        let factory = grid.cell_factory(renderer.texture_factory(&gpu));

        let (watcher, modified) = if self.cfg.watch {
            let (tx, rx) = xchan::unbounded();
            match start_watcher(&self.cfg.photo_library_path, tx) {
                Ok(watcher) => (Some(watcher), Some(rx)),
                Err(err) => {
                    warn!(error = %err, "photo library watch unavailable; edits will not reload");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        let (tx, rx) = xchan::bounded(self.cfg.loader_queue);
        let proxy = self.proxy.clone();
        let thread = spawn_loader(
            std::mem::take(&mut self.photos),
            factory,
            tx,
            modified,
            move || {
                let _ = proxy.send_event(ViewerEvent::LoaderReady);
            },
        )?;

        widget(&mut grid).show();
        info!(
            columns = grid.n_cols(),
            rows = grid.n_rows(),
            width = grid.width(),
            height = grid.height(),
            "photo grid shown"
        );

        self.gpu = Some(gpu);
        self.renderer = Some(renderer);
        self.grid = Some(grid);
        self.loader = Some(LoaderLink {
            events: rx,
            _watcher: watcher,
            _thread: thread,
        });
        Ok(())
    }

    fn drain_loader(&mut self) {
        let (Some(loader), Some(grid)) = (self.loader.as_ref(), self.grid.as_mut()) else {
            return;
        };
        let mut dirty = false;
        for event in loader.events.try_iter() {
            match event {
                LoaderEvent::Cell { path, cell } => {
                    trace!(path = %path.display(), "appending cell");
                    grid.append_cell(cell);
                }
                LoaderEvent::Populated { loaded, skipped } => {
                    info!(loaded, skipped, "grid populated");
                    grid.set_populated(true);
                }
                LoaderEvent::Replaced(path) => {
                    debug!(path = %path.display(), "cell texture replaced");
                }
            }
            dirty = true;
        }
        if dirty {
            self.request_redraw();
        }
    }

    /// Forward a pending grid repaint to the window.
    fn sync_redraw(&mut self) {
        let wants = self
            .grid
            .as_mut()
            .is_some_and(|grid| widget(grid).take_paint_request());
        if wants {
            self.request_redraw();
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state == ElementState::Pressed
            && matches!(
                event.physical_key,
                PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ)
            )
        {
            info!("quit requested from keyboard");
            event_loop.exit();
            return;
        }
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let key = map_key(event.physical_key);
        let input = match event.state {
            ElementState::Pressed => InputEvent::KeyPress(key),
            ElementState::Released => InputEvent::KeyRelease(key),
        };
        widget(grid).handle_event(&input);
        self.sync_redraw();
    }

    fn draw(&mut self) {
        let (Some(gpu), Some(renderer), Some(grid), Some(window)) = (
            self.gpu.as_mut(),
            self.renderer.as_ref(),
            self.grid.as_mut(),
            self.window.as_ref(),
        ) else {
            return;
        };

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Outdated | SurfaceError::Lost | SurfaceError::Other) => {
                info!("grid surface lost; reconfiguring");
                let size = window.inner_size();
                gpu.resize(size.width, size.height);
                window.request_redraw();
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("grid surface out of memory; skipping frame");
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("grid surface acquisition timed out");
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("grid-encoder"),
            });

        let mut painter = renderer.painter(grid.width(), grid.height());
        widget(grid).paint(&mut painter);
        renderer.render(gpu, painter, &view, &mut encoder);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        window.pre_present_notify();
        frame.present();

        self.sync_redraw();
    }
}

impl ApplicationHandler<ViewerEvent> for GridViewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(window) = self.create_window(event_loop) else {
            event_loop.exit();
            return;
        };
        if let Err(err) = self.init(window) {
            error!(error = ?err, "failed to initialize photo grid");
            event_loop.exit();
            return;
        }
        self.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("grid window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
                self.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::LoaderReady => trace!("loader wake-up"),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.drain_loader();
        if let Some(grid) = self.grid.as_mut() {
            grid.run_due_timers(Instant::now());
        }
        self.sync_redraw();

        let flow = self
            .grid
            .as_ref()
            .and_then(PhotoGrid::next_deadline)
            .map_or(ControlFlow::Wait, ControlFlow::WaitUntil);
        event_loop.set_control_flow(flow);
    }
}

fn map_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::ArrowLeft) => Key::Left,
        PhysicalKey::Code(KeyCode::ArrowRight) => Key::Right,
        PhysicalKey::Code(KeyCode::ArrowUp) => Key::Up,
        PhysicalKey::Code(KeyCode::ArrowDown) => Key::Down,
        PhysicalKey::Code(KeyCode::Numpad4) => Key::KeypadLeft,
        PhysicalKey::Code(KeyCode::Numpad6) => Key::KeypadRight,
        PhysicalKey::Code(KeyCode::Numpad8) => Key::KeypadUp,
        PhysicalKey::Code(KeyCode::Numpad2) => Key::KeypadDown,
        PhysicalKey::Code(KeyCode::Enter) => Key::Return,
        PhysicalKey::Code(KeyCode::NumpadEnter) => Key::KeypadEnter,
        PhysicalKey::Code(code) => Key::Other(format!("{code:?}")),
        PhysicalKey::Unidentified(native) => Key::Other(format!("{native:?}")),
    }
}

/// Open the grid window and run until it is closed.
///
/// # Errors
/// Returns an error if the event loop cannot be created or fails.
pub fn run_grid(cfg: Configuration, photos: Vec<PathBuf>) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();
    info!(count = photos.len(), "starting photo grid");

    let mut app = GridViewer::new(cfg, photos, proxy);
    event_loop
        .run_app(&mut app)
        .context("viewer event loop failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_navigation_keys() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowLeft)), Key::Left);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Numpad8)), Key::KeypadUp);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::NumpadEnter)), Key::KeypadEnter);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Enter)), Key::Return);
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::Space)),
            Key::Other("Space".into())
        );
    }
}
