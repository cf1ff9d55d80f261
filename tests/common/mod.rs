#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use photo_grid::grid::{PhotoGrid, SharedTextures};
use photo_grid::paint::{BlendMode, Color, Painter, Quad, TextureFactory};
use photo_grid::pixbuf::PixelBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeTexture {
    pub id: usize,
    pub size: (u32, u32),
}

#[derive(Debug, Default)]
pub struct FakeFactory {
    next: AtomicUsize,
}

impl TextureFactory for FakeFactory {
    type Texture = FakeTexture;

    fn create_texture(&self, pixels: &PixelBuffer) -> FakeTexture {
        FakeTexture {
            id: self.next.fetch_add(1, Ordering::Relaxed),
            size: (pixels.width(), pixels.height()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Push,
    Pop,
    Translate(f32, f32),
    Scale(f32, f32),
    Rotate(f32),
    Color(Color),
    Blend(BlendMode),
    Smoothing(bool),
    FillRect(Quad),
    RoundedRect(Quad, f32),
    Textured {
        id: usize,
        quad: Quad,
        lock_held: bool,
    },
}

/// Records every call; checks the texture lock while quads are rendered.
pub struct RecordingPainter {
    pub ops: Vec<Op>,
    textures: SharedTextures<FakeTexture>,
}

impl RecordingPainter {
    pub fn new(textures: &SharedTextures<FakeTexture>) -> Self {
        Self {
            ops: Vec::new(),
            textures: textures.clone(),
        }
    }

    pub fn textured(&self) -> Vec<(usize, Quad, bool)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Textured {
                    id,
                    quad,
                    lock_held,
                } => Some((*id, *quad, *lock_held)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Painter for RecordingPainter {
    type Texture = FakeTexture;

    fn push_matrix(&mut self) {
        self.ops.push(Op::Push);
    }

    fn pop_matrix(&mut self) {
        self.ops.push(Op::Pop);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.ops.push(Op::Translate(x, y));
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.ops.push(Op::Scale(x, y));
    }

    fn rotate(&mut self, degrees: f32) {
        self.ops.push(Op::Rotate(degrees));
    }

    fn set_color(&mut self, color: Color) {
        self.ops.push(Op::Color(color));
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.ops.push(Op::Blend(mode));
    }

    fn set_smoothing(&mut self, enabled: bool) {
        self.ops.push(Op::Smoothing(enabled));
    }

    fn fill_rect(&mut self, quad: Quad) {
        self.ops.push(Op::FillRect(quad));
    }

    fn rounded_rect(&mut self, quad: Quad, radius: f32) {
        self.ops.push(Op::RoundedRect(quad, radius));
    }

    fn textured_quad(&mut self, texture: &FakeTexture, quad: Quad) {
        self.ops.push(Op::Textured {
            id: texture.id,
            quad,
            lock_held: !self.textures.is_unlocked(),
        });
    }
}

/// A grid filled with `n` square `side`×`side` photos.
pub fn grid_with_cells(
    width: u32,
    height: u32,
    cols: usize,
    rows: usize,
    n: usize,
    side: u32,
) -> PhotoGrid<FakeTexture> {
    let mut grid = PhotoGrid::new(width, height, cols, rows, "/photos");
    let factory = FakeFactory::default();
    for _ in 0..n {
        let cell = grid
            .cell_new(&factory, PixelBuffer::filled(side, side, [90, 120, 150, 255]))
            .unwrap();
        grid.append_cell(cell);
    }
    grid.set_populated(true);
    grid
}

/// Tick until the grid leaves its transition; returns the number of ticks.
pub fn settle(grid: &mut PhotoGrid<FakeTexture>) -> usize {
    let mut ticks = 0;
    while grid.state().is_transition() {
        grid.tick();
        ticks += 1;
        assert!(ticks < 1000, "transition never resolved");
    }
    ticks
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
