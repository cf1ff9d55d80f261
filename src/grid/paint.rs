use super::{CellState, PhotoGrid, ViewState};
use crate::paint::{BlendMode, Color, Painter, Quad};

pub const BACKGROUND: Color = Color::rgb(0.6, 0.6, 0.62);
pub const ACTIVE_TINT: Color = Color::WHITE;
pub const INACTIVE_TINT: Color = Color::rgba(0.9, 0.95, 0.95, 1.0);
pub const SHADOW_TINT: Color = Color::rgba(0.1, 0.1, 0.1, 0.3);

/// Frame overhang around the photo, in pixels.
const FRAME: i32 = 4;

impl<T> PhotoGrid<T> {
    pub(super) fn paint_grid<P>(&mut self, painter: &mut P)
    where
        P: Painter<Texture = T>,
    {
        painter.push_matrix();

        if self.cells.is_empty() {
            painter.set_color(BACKGROUND);
            painter.fill_rect(self.background_quad());
            painter.pop_matrix();
            return;
        }

        // Saturate blending only composites correctly front to back over a
        // transparent black clear, so the background goes in last.
        painter.set_blend(BlendMode::Saturate);
        painter.set_smoothing(true);
        painter.set_color(Color::WHITE);

        let params = self.paint;
        painter.translate(params.trans_x, params.trans_y);
        painter.scale(params.zoom, params.zoom);

        let n_cols = self.n_cols as i32;
        let n_rows = self.n_rows as i32;
        let browsing = self.state == ViewState::Browse;

        let mut idx = params.first_cell;
        let mut y = params.start_y;
        let mut growing = false;
        'rows: for _ in 0..=self.n_rows {
            let mut x = 0;
            for _ in 0..self.n_cols {
                let Some(cell) = self.cells.get_mut(idx) else {
                    break 'rows;
                };

                let mut thumb_w = cell.pixbuf().width() as i32 / n_cols;
                let mut thumb_h = cell.pixbuf().height() as i32 / n_rows;

                let grow = cell.tick_appearance();
                thumb_w += grow;
                thumb_h += grow;
                growing |= cell.state() == CellState::Appearing;

                let ew_border = thumb_w / 8;
                let ns_border = thumb_h / 8;
                thumb_w -= 2 * ew_border;
                thumb_h -= 2 * ns_border;

                let x1 = x + (self.cell_width - thumb_w) / 2;
                let y1 = y + (self.cell_height - thumb_h) / 2;
                let x2 = x1 + thumb_w;
                let y2 = y1 + thumb_h;

                painter.push_matrix();
                painter.translate((x1 + (x2 - x1) / 2) as f32, (y1 + (y2 - y1) / 2) as f32);
                if cell.state() != CellState::Appearing {
                    painter.rotate(cell.angle());
                }

                let (hw, hh) = (thumb_w / 2, thumb_h / 2);
                let photo = Quad::new(-hw as f32, -hh as f32, hw as f32, hh as f32);
                self.textures
                    .with(cell.texture(), |texture| painter.textured_quad(texture, photo));

                let tint = if browsing && self.active == Some(idx) {
                    ACTIVE_TINT
                } else {
                    INACTIVE_TINT
                };
                let radius = (thumb_w / 30) as f32;
                let frame = Quad::new(
                    (-hw - FRAME) as f32,
                    (-hh - FRAME) as f32,
                    (hw + FRAME) as f32,
                    (hh + ns_border) as f32,
                );
                painter.set_color(tint);
                painter.rounded_rect(frame, radius);

                painter.set_color(SHADOW_TINT);
                painter.rounded_rect(
                    Quad::new(frame.x1 + 1.0, frame.y1 + 1.0, frame.x2 + 1.0, frame.y2 + 1.0),
                    radius,
                );

                painter.set_color(Color::WHITE);
                painter.pop_matrix();

                idx += 1;
                x += self.cell_width;
            }
            y += self.cell_height;
        }

        painter.pop_matrix();

        painter.set_color(BACKGROUND);
        painter.fill_rect(self.background_quad());

        painter.set_smoothing(false);
        painter.set_blend(BlendMode::Replace);

        if growing {
            self.queue_paint();
        }
    }

    fn background_quad(&self) -> Quad {
        Quad::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}
