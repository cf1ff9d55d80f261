//! The photo grid widget.
//!
//! A fixed number of columns and visible rows of tilted, bordered thumbnails
//! that can be scrolled through with the keyboard and zoomed into one cell at
//! a time. All mutation happens on the UI thread; the only state shared with
//! the loader thread is the texture table ([`SharedTextures`]).

mod cell;
mod input;
mod paint;
mod state;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, trace};

pub use cell::{
    APPEAR_COUNTDOWN, APPEAR_STEP, Cell, CellFactory, CellState, MAX_TILT_DEGREES,
    SharedTextures, TextureSlot,
};
pub use input::{GridCommand, route_key};
pub use paint::{ACTIVE_TINT, BACKGROUND, INACTIVE_TINT, SHADOW_TINT};
pub use state::{Camera, PaintParams, ViewState};

use crate::config::{Configuration, fps_to_interval};
use crate::paint::{Painter, TextureFactory};
use crate::pixbuf::PixelBuffer;
use crate::timer::{Control, TimerQueue};
use crate::widget::{InputEvent, Widget};

const DEFAULT_ANIM_FPS: u32 = 50;
const DEFAULT_ANIM_STEPS: u32 = 10;
const DEFAULT_POPULATE_FPS: u32 = 20;

pub struct PhotoGrid<T> {
    width: u32,
    height: u32,
    img_path: PathBuf,

    n_cols: usize,
    n_rows: usize,
    /// First fully visible row.
    row_offset: usize,
    cell_width: i32,
    cell_height: i32,

    cells: Vec<Cell>,
    active: Option<usize>,
    populated: bool,

    anim_fps: u32,
    anim_n_steps: u32,
    anim_step: u32,
    populate_fps: u32,

    camera: Camera,
    paint: PaintParams,
    state: ViewState,

    textures: SharedTextures<T>,
    timers: TimerQueue,
    paint_requested: bool,
}

impl<T> PhotoGrid<T> {
    /// A `width`×`height` grid showing `n_cols` columns and `n_rows` rows.
    ///
    /// `n_cols` and `n_rows` must be non-zero.
    pub fn new(
        width: u32,
        height: u32,
        n_cols: usize,
        n_rows: usize,
        img_path: impl Into<PathBuf>,
    ) -> Self {
        let n_cols = n_cols.max(1);
        let n_rows = n_rows.max(1);
        let cell_width = (width as usize / n_cols) as i32;
        let cell_height = (height as usize / n_rows) as i32;

        let zoom_min = 1.0;
        let width_f = width as f32;
        let camera = Camera {
            zoom_min,
            // Zooming to a single cell assumes a square layout.
            zoom_max: n_rows as f32,
            view_min_x: (width_f - zoom_min * width_f) / 2.0,
            view_max_x: 0.0,
            view_min_y: 0.0,
            view_max_y: 0.0,
            scroll_dist: 0.0,
        };

        let mut grid = Self {
            width,
            height,
            img_path: img_path.into(),
            n_cols,
            n_rows,
            row_offset: 0,
            cell_width,
            cell_height,
            cells: Vec::new(),
            active: None,
            populated: false,
            anim_fps: DEFAULT_ANIM_FPS,
            anim_n_steps: DEFAULT_ANIM_STEPS,
            anim_step: 0,
            populate_fps: DEFAULT_POPULATE_FPS,
            camera,
            paint: PaintParams::default(),
            state: ViewState::Browse,
            textures: SharedTextures::new(),
            timers: TimerQueue::new(),
            paint_requested: false,
        };
        grid.paint = grid.resting_params();
        grid
    }

    /// Build a grid from the validated configuration.
    pub fn from_config(cfg: &Configuration) -> Self {
        let mut grid = Self::new(
            cfg.width,
            cfg.height,
            cfg.columns as usize,
            cfg.rows as usize,
            cfg.photo_library_path.clone(),
        );
        grid.set_fps(cfg.anim_fps);
        grid.set_anim_steps(cfg.anim_steps);
        grid.populate_fps = cfg.populate_fps;
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn img_path(&self) -> &Path {
        &self.img_path
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn cell_size(&self) -> (i32, i32) {
        (self.cell_width, self.cell_height)
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Transform and visible window computed by the last visual-state update.
    pub fn paint_params(&self) -> &PaintParams {
        &self.paint
    }

    pub fn anim_step(&self) -> u32 {
        self.anim_step
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.anim_fps = fps;
    }

    pub fn fps(&self) -> u32 {
        self.anim_fps
    }

    pub fn set_anim_steps(&mut self, steps: u32) {
        self.anim_n_steps = steps;
    }

    pub fn anim_steps(&self) -> u32 {
        self.anim_n_steps
    }

    pub fn set_populated(&mut self, populated: bool) {
        self.populated = populated;
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Handle to the texture table; the loader uploads through a clone of it.
    pub fn textures(&self) -> &SharedTextures<T> {
        &self.textures
    }

    /// A cell builder bound to this grid's bounds and texture table.
    pub fn cell_factory<F>(&self, factory: F) -> CellFactory<F>
    where
        F: TextureFactory<Texture = T>,
    {
        CellFactory::new(self.width, self.height, self.textures.clone(), factory)
    }

    /// Create a cell sized for this grid. The cell still has to be appended.
    pub fn cell_new<F>(&self, factory: &F, pixbuf: PixelBuffer) -> Result<Cell>
    where
        F: TextureFactory<Texture = T>,
    {
        Cell::new(pixbuf, self.width, self.height, &self.textures, factory)
    }

    /// Append a cell to the end of the grid. The first cell becomes active.
    pub fn append_cell(&mut self, cell: Cell) {
        self.cells.push(cell);
        if self.active.is_none() {
            self.active = Some(0);
        }
        trace!(count = self.cells.len(), "cell appended");
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get_first_cell(&self) -> Option<&Cell> {
        self.cells.first()
    }

    pub fn get_active_cell(&self) -> Option<&Cell> {
        self.active.and_then(|idx| self.cells.get(idx))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Focus the cell at `index` and make it the zoom target. Does not
    /// scroll. Out-of-range indices are ignored.
    pub fn set_active_cell(&mut self, index: usize) -> bool {
        if index >= self.cells.len() {
            return false;
        }
        self.active = Some(index);
        self.aim_camera(index);
        if !self.state.is_transition() {
            self.update_visual_state();
        }
        self.queue_paint();
        true
    }

    /// The pixel buffer backing the cell at `index`.
    pub fn cell_pixbuf(&self, index: usize) -> Option<&PixelBuffer> {
        self.cells.get(index).map(Cell::pixbuf)
    }

    /// Map the grid and start polling for cells if the loader is still busy.
    pub fn show(&mut self) {
        self.state = ViewState::Browse;
        if !self.populated {
            self.schedule_ticker(fps_to_interval(self.populate_fps));
        }
        self.queue_paint();
    }

    pub fn paint<P>(&mut self, painter: &mut P)
    where
        P: Painter<Texture = T>,
    {
        self.paint_grid(painter);
    }

    /// Timer callback: advance the animation and decide whether to keep ticking.
    pub fn tick(&mut self) -> Control {
        self.update_visual_state();
        self.queue_paint();

        if !self.populated {
            return Control::Continue;
        }
        if self.state.is_transition() {
            Control::Continue
        } else {
            Control::Stop
        }
    }

    /// Run the tick for every due timer. Returns how many fired.
    pub fn run_due_timers(&mut self, now: Instant) -> usize {
        let due = self.timers.due(now);
        for id in &due {
            let control = self.tick();
            self.timers.settle(*id, control, now);
        }
        due.len()
    }

    /// When the next armed ticker wants to run.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn active_tickers(&self) -> usize {
        self.timers.len()
    }

    pub fn take_paint_request(&mut self) -> bool {
        std::mem::take(&mut self.paint_requested)
    }

    fn queue_paint(&mut self) {
        self.paint_requested = true;
    }

    fn schedule_ticker(&mut self, interval: Duration) {
        let id = self.timers.schedule_repeating(interval, Instant::now());
        debug!(?id, ?interval, tickers = self.timers.len(), "ticker armed");
    }

    fn schedule_anim_ticker(&mut self) {
        self.schedule_ticker(fps_to_interval(self.anim_fps));
    }
}

impl<P> Widget<P> for PhotoGrid<P::Texture>
where
    P: Painter,
{
    fn show(&mut self) {
        PhotoGrid::show(self);
    }

    fn paint(&mut self, painter: &mut P) {
        self.paint_grid(painter);
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        PhotoGrid::handle_event(self, event)
    }

    fn take_paint_request(&mut self) -> bool {
        PhotoGrid::take_paint_request(self)
    }
}
