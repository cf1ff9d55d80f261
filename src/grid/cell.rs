//! Grid cells and the texture table they share with the loader thread.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use rand::Rng;

use crate::paint::TextureFactory;
use crate::pixbuf::{PixelBuffer, fit_within};

/// Countdown a fresh cell starts its grow-in animation from.
pub const APPEAR_COUNTDOWN: i32 = 15;
/// Countdown decrement per painted frame.
pub const APPEAR_STEP: i32 = 4;
pub const MAX_TILT_DEGREES: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Growing into place; drawn inflated and without tilt.
    Appearing,
    Static,
}

/// Index of a texture inside a [`SharedTextures`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSlot(usize);

impl TextureSlot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Every texture of one grid, behind the grid's single texture mutex.
///
/// The lock covers GPU uploads (insert/replace) and GPU reads (render); the
/// cell list itself lives outside it.
pub struct SharedTextures<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for SharedTextures<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedTextures<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> SharedTextures<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture with the lock held and store it in a fresh slot.
    pub fn insert_with(&self, create: impl FnOnce() -> T) -> TextureSlot {
        let mut textures = self.inner.lock();
        textures.push(create());
        TextureSlot(textures.len() - 1)
    }

    /// Swap the texture in `slot` for a newly created one. Returns `false`
    /// (without calling `create`) if the slot does not exist.
    pub fn replace_with(&self, slot: TextureSlot, create: impl FnOnce() -> T) -> bool {
        let mut textures = self.inner.lock();
        match textures.get_mut(slot.0) {
            Some(texture) => {
                *texture = create();
                true
            }
            None => false,
        }
    }

    /// Run `use_texture` against the texture in `slot` with the lock held.
    pub fn with<R>(&self, slot: TextureSlot, use_texture: impl FnOnce(&T) -> R) -> Option<R> {
        let textures = self.inner.lock();
        textures.get(slot.0).map(use_texture)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if the lock is currently free.
    pub fn is_unlocked(&self) -> bool {
        !self.inner.is_locked()
    }
}

#[derive(Debug)]
pub struct Cell {
    pixbuf: PixelBuffer,
    texture: TextureSlot,
    angle: f32,
    anim_step: i32,
    state: CellState,
}

impl Cell {
    /// Scale `pixbuf` into `max_width`×`max_height`, upload it into
    /// `textures` and wrap it in a new appearing cell with a random tilt.
    pub fn new<F: TextureFactory>(
        pixbuf: PixelBuffer,
        max_width: u32,
        max_height: u32,
        textures: &SharedTextures<F::Texture>,
        factory: &F,
    ) -> Result<Self> {
        let pixbuf = fit_pixbuf(pixbuf, max_width, max_height)?;
        let texture = textures.insert_with(|| factory.create_texture(&pixbuf));
        let angle = rand::rng().random_range(-MAX_TILT_DEGREES..=MAX_TILT_DEGREES) as f32;
        Ok(Self {
            pixbuf,
            texture,
            angle,
            anim_step: APPEAR_COUNTDOWN,
            state: CellState::Appearing,
        })
    }

    pub fn pixbuf(&self) -> &PixelBuffer {
        &self.pixbuf
    }

    pub fn texture(&self) -> TextureSlot {
        self.texture
    }

    /// Decorative tilt in degrees, fixed for the cell's lifetime.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn countdown(&self) -> i32 {
        self.anim_step
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    /// Advance the grow-in animation by one painted frame and return how many
    /// pixels to inflate the thumbnail by (zero once static).
    pub fn tick_appearance(&mut self) -> i32 {
        if self.state != CellState::Appearing {
            return 0;
        }
        self.anim_step -= APPEAR_STEP;
        if self.anim_step <= 0 {
            self.state = CellState::Static;
            self.anim_step = 0;
        }
        self.anim_step
    }
}

/// Builds cells sized for one grid, uploading their textures into the grid's
/// shared table. Owned by whichever thread produces cells.
pub struct CellFactory<F: TextureFactory> {
    max_width: u32,
    max_height: u32,
    textures: SharedTextures<F::Texture>,
    factory: F,
}

impl<F: TextureFactory> CellFactory<F> {
    pub fn new(
        max_width: u32,
        max_height: u32,
        textures: SharedTextures<F::Texture>,
        factory: F,
    ) -> Self {
        Self {
            max_width,
            max_height,
            textures,
            factory,
        }
    }

    pub fn cell_new(&self, pixbuf: PixelBuffer) -> Result<Cell> {
        Cell::new(
            pixbuf,
            self.max_width,
            self.max_height,
            &self.textures,
            &self.factory,
        )
    }

    /// Upload new pixels for an existing cell's texture slot.
    pub fn replace_texture(&self, slot: TextureSlot, pixbuf: PixelBuffer) -> Result<bool> {
        let pixbuf = fit_pixbuf(pixbuf, self.max_width, self.max_height)?;
        Ok(self
            .textures
            .replace_with(slot, || self.factory.create_texture(&pixbuf)))
    }
}

fn fit_pixbuf(pixbuf: PixelBuffer, max_width: u32, max_height: u32) -> Result<PixelBuffer> {
    match fit_within(pixbuf.width(), pixbuf.height(), max_width, max_height) {
        Some((w, h)) => pixbuf.scale_down(w, h),
        None => Ok(pixbuf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SizeFactory;

    impl TextureFactory for SizeFactory {
        type Texture = (u32, u32);

        fn create_texture(&self, pixels: &PixelBuffer) -> (u32, u32) {
            (pixels.width(), pixels.height())
        }
    }

    #[test]
    fn countdown_runs_to_static() {
        let factory = CellFactory::new(100, 100, SharedTextures::new(), SizeFactory);
        let mut cell = factory.cell_new(PixelBuffer::filled(8, 8, [0; 4])).unwrap();
        assert_eq!(cell.countdown(), APPEAR_COUNTDOWN);
        let seen: Vec<i32> = (0..5).map(|_| cell.tick_appearance()).collect();
        assert_eq!(seen, vec![11, 7, 3, 0, 0]);
        assert_eq!(cell.state(), CellState::Static);
    }

    #[test]
    fn replace_keeps_slot_and_scales() {
        let textures = SharedTextures::new();
        let factory = CellFactory::new(50, 50, textures.clone(), SizeFactory);
        let cell = factory.cell_new(PixelBuffer::filled(10, 10, [0; 4])).unwrap();
        assert!(
            factory
                .replace_texture(cell.texture(), PixelBuffer::filled(200, 100, [0; 4]))
                .unwrap()
        );
        assert_eq!(textures.with(cell.texture(), |t| *t), Some((50, 25)));
        assert_eq!(textures.len(), 1);
        assert!(
            !factory
                .replace_texture(TextureSlot(7), PixelBuffer::filled(1, 1, [0; 4]))
                .unwrap()
        );
    }
}
