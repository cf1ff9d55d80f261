//! Navigation, activation and the per-tick camera interpolation.

use tracing::debug;

use super::PhotoGrid;
use crate::widget::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Browse,
    ZoomIn,
    Zoomed,
    ZoomOut,
    ZoomedMove,
    ScrolledMove,
}

impl ViewState {
    /// `true` for the states an animation ticker has to drive to completion.
    pub fn is_transition(self) -> bool {
        matches!(
            self,
            Self::ZoomIn | Self::ZoomOut | Self::ZoomedMove | Self::ScrolledMove
        )
    }
}

/// Start and end points the animations interpolate between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// "From" translate.
    pub view_min_x: f32,
    pub view_min_y: f32,
    /// "To" translate, centering the active cell under full zoom.
    pub view_max_x: f32,
    pub view_max_y: f32,
    /// One cell height; positive when scrolling up, negative when scrolling down.
    pub scroll_dist: f32,
}

/// Values the paint pass consumes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaintParams {
    pub trans_x: f32,
    pub trans_y: f32,
    pub zoom: f32,
    /// y coordinate of the first painted row, before the transform.
    pub start_y: i32,
    /// Index of the first painted cell.
    pub first_cell: usize,
}

enum Scroll {
    Up,
    Down,
}

impl<T> PhotoGrid<T> {
    /// Move the focus one cell in `direction`, scrolling or panning as needed.
    pub fn navigate(&mut self, direction: Direction) {
        let Some(orig) = self.active else {
            return;
        };
        let len = self.cells.len();
        let cols = self.n_cols;

        let moved = match direction {
            Direction::South => orig.checked_add(cols).filter(|&idx| idx < len),
            Direction::North => orig.checked_sub(cols),
            Direction::East => orig.checked_add(1).filter(|&idx| idx < len),
            Direction::West => orig.checked_sub(1),
        };
        let Some(idx) = moved.filter(|&idx| idx != orig) else {
            return;
        };
        self.active = Some(idx);

        if let Some(scroll) = self.offscreen(idx) {
            if self.state != ViewState::Zoomed {
                // Any zoom transition in flight is abandoned for a plain scroll.
                self.reset_view_origin();
                self.state = ViewState::ScrolledMove;
            }
            match scroll {
                Scroll::Up => {
                    self.camera.scroll_dist = self.cell_height as f32;
                    self.row_offset = self.row_offset.saturating_sub(1);
                }
                Scroll::Down => {
                    self.camera.scroll_dist = -(self.cell_height as f32);
                    self.row_offset += 1;
                }
            }
            if self.state != ViewState::Zoomed {
                self.schedule_anim_ticker();
            }
        }

        if self.state == ViewState::Zoomed {
            self.state = ViewState::ZoomedMove;
            self.camera.view_min_x = self.camera.view_max_x;
            self.camera.view_min_y = self.camera.view_max_y;
            self.anim_step = 0;
            self.schedule_anim_ticker();
        }

        let (x, y) = self.aim_camera(idx);
        debug!(
            idx,
            x,
            y,
            row_offset = self.row_offset,
            view_x = self.camera.view_max_x,
            view_y = self.camera.view_max_y,
            state = ?self.state,
            "navigated"
        );

        self.queue_paint();
    }

    /// Zoom into the active cell from `Browse`, or back out from `Zoomed`.
    /// Ignored while a transition is running.
    pub fn activate(&mut self) {
        match self.state {
            ViewState::Browse => {
                self.state = ViewState::ZoomIn;
                self.schedule_anim_ticker();
            }
            ViewState::Zoomed => {
                self.state = ViewState::ZoomOut;
                self.reset_view_origin();
                self.schedule_anim_ticker();
            }
            state => debug!(?state, "activate ignored mid-transition"),
        }
    }

    /// Point the zoomed view at cell `idx`; returns its column and row.
    pub(super) fn aim_camera(&mut self, idx: usize) -> (usize, usize) {
        let (x, y) = (idx % self.n_cols, idx / self.n_cols);
        self.camera.view_max_x = -(self.cell_width as f32) * self.camera.zoom_max * x as f32;
        self.camera.view_max_y = -(self.cell_height as f32) * self.camera.zoom_max * y as f32;
        (x, y)
    }

    fn reset_view_origin(&mut self) {
        let width = self.width as f32;
        self.camera.view_min_x = (width - self.camera.zoom_min * width) / 2.0;
        self.camera.view_min_y = 0.0;
    }

    fn offscreen(&self, idx: usize) -> Option<Scroll> {
        let first = self.row_offset * self.n_cols;
        if idx < first {
            Some(Scroll::Up)
        } else if idx >= first + self.n_cols * self.n_rows {
            Some(Scroll::Down)
        } else {
            None
        }
    }

    /// Paint parameters of the resting `Browse` view at the current row offset.
    pub(super) fn resting_params(&self) -> PaintParams {
        let row_offset_h = self.row_offset as i32 * self.cell_height;
        PaintParams {
            trans_x: self.camera.view_min_x,
            trans_y: self.camera.view_min_y - row_offset_h as f32,
            zoom: self.camera.zoom_min,
            start_y: row_offset_h,
            first_cell: self.n_cols * self.row_offset,
        }
    }

    /// Advance the running transition by one step and recompute the paint
    /// parameters. Fractions are step based, so irregular tick spacing only
    /// changes the pace, never the path.
    pub fn update_visual_state(&mut self) {
        let cam = self.camera;
        // Differences are whole pixels.
        let view_x_diff = (cam.view_max_x - cam.view_min_x).trunc();
        let view_y_diff = (cam.view_max_y - cam.view_min_y).trunc();
        let zoom_diff = (cam.zoom_max - cam.zoom_min).trunc();
        let row_offset_h = self.row_offset as i32 * self.cell_height;
        let total = self.anim_n_steps.max(1);

        let mut p = self.resting_params();

        if self.state != ViewState::Browse {
            let mut scroll_min_y_offset = row_offset_h as f32;

            p.zoom = cam.zoom_max;
            p.trans_x = cam.view_max_x;
            p.trans_y = cam.view_max_y;

            match self.state {
                ViewState::ZoomIn | ViewState::ZoomOut => {
                    let zoom_in = self.state == ViewState::ZoomIn;
                    self.anim_step += 1;
                    if self.anim_step >= total {
                        self.anim_step = 0;
                        if zoom_in {
                            self.state = ViewState::Zoomed;
                        } else {
                            p.zoom = cam.zoom_min;
                            p.trans_x = cam.view_min_x;
                            p.trans_y = cam.view_min_y - scroll_min_y_offset;
                            self.state = ViewState::Browse;
                        }
                    } else {
                        let f = if zoom_in {
                            self.anim_step as f32 / total as f32
                        } else {
                            (total - self.anim_step) as f32 / total as f32
                        };
                        scroll_min_y_offset *= cam.zoom_max;

                        p.zoom = cam.zoom_min + zoom_diff * f;
                        p.trans_x = view_x_diff * f;
                        p.trans_y = (view_y_diff + scroll_min_y_offset) * f;
                        p.start_y = 0;
                    }
                }
                ViewState::ZoomedMove => {
                    self.anim_step += 1;
                    if self.anim_step >= total {
                        self.state = ViewState::Zoomed;
                        self.anim_step = 0;
                    } else {
                        let f = self.anim_step as f32 / total as f32;
                        p.trans_x = cam.view_min_x + view_x_diff * f;
                        p.trans_y = cam.view_min_y + view_y_diff * f;
                    }
                }
                ViewState::ScrolledMove => {
                    let quarter = (total / 4).max(1);
                    p.zoom = cam.zoom_min;
                    p.trans_x = cam.view_min_x;
                    p.trans_y = cam.view_min_y - row_offset_h as f32;
                    self.anim_step += 1;

                    if self.anim_step >= quarter {
                        self.state = ViewState::Browse;
                        self.anim_step = 0;
                    } else {
                        let f = self.anim_step as f32 / quarter as f32;
                        p.trans_y += cam.scroll_dist * f;
                        if cam.scroll_dist > 0.0 {
                            // Scrolling up: the incoming row sits one row higher.
                            p.start_y = (self.row_offset as i32 - 1) * self.cell_height;
                        } else {
                            // Scrolling down: keep painting the outgoing row.
                            p.first_cell = self.n_cols * self.row_offset.saturating_sub(1);
                        }
                    }
                }
                ViewState::Zoomed | ViewState::Browse => {}
            }
        }

        self.paint = p;
    }
}
