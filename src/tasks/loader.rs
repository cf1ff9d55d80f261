//! Background photo loader.
//!
//! Decodes scanned photos off the UI thread, builds their cells through a
//! [`CellFactory`] (scaling and texture upload happen here, under the grid's
//! texture lock) and hands finished cells to the UI loop. Once the library is
//! in, it keeps reloading watched files in place until the watch channel
//! closes or the UI loop goes away.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::events::{LoaderEvent, PhotoModified};
use crate::grid::{CellFactory, TextureSlot};
use crate::paint::TextureFactory;
use crate::pixbuf::PixelBuffer;

/// Spawn the loader thread.
///
/// `wake` runs after every event sent so a sleeping UI loop notices it.
pub fn spawn_loader<F, W>(
    paths: Vec<PathBuf>,
    factory: CellFactory<F>,
    events: Sender<LoaderEvent>,
    modified: Option<Receiver<PhotoModified>>,
    wake: W,
) -> Result<JoinHandle<()>>
where
    F: TextureFactory + 'static,
    F::Texture: 'static,
    W: Fn() + Send + 'static,
{
    thread::Builder::new()
        .name("photo-loader".into())
        .spawn(move || {
            let mut loader = Loader {
                factory,
                events,
                wake,
                slots: HashMap::new(),
            };
            if loader.populate(paths).is_none() {
                debug!("grid gone; loader stopping");
                return;
            }
            if let Some(modified) = modified {
                loader.serve_reloads(&modified);
            }
        })
        .context("failed to spawn loader thread")
}

struct Loader<F: TextureFactory, W> {
    factory: CellFactory<F>,
    events: Sender<LoaderEvent>,
    wake: W,
    slots: HashMap<PathBuf, TextureSlot>,
}

impl<F: TextureFactory, W: Fn()> Loader<F, W> {
    /// `None` once the receiving side has hung up.
    fn send(&self, event: LoaderEvent) -> Option<()> {
        self.events.send(event).ok()?;
        (self.wake)();
        Some(())
    }

    fn populate(&mut self, paths: Vec<PathBuf>) -> Option<()> {
        let mut skipped = 0;
        for path in paths {
            let built = decode_pixbuf(&path).and_then(|pixbuf| self.factory.cell_new(pixbuf));
            match built {
                Ok(cell) => {
                    debug!(path = %path.display(), angle = cell.angle(), "cell ready");
                    self.slots.insert(path.clone(), cell.texture());
                    self.send(LoaderEvent::Cell { path, cell })?;
                }
                Err(err) => {
                    skipped += 1;
                    warn!(path = %path.display(), error = ?err, "skipping unreadable photo");
                }
            }
        }
        let loaded = self.slots.len();
        info!(loaded, skipped, "photo library loaded");
        self.send(LoaderEvent::Populated { loaded, skipped })
    }

    fn serve_reloads(&mut self, modified: &Receiver<PhotoModified>) {
        for PhotoModified(path) in modified.iter() {
            let Some(&slot) = self.slots.get(&path) else {
                debug!(path = %path.display(), "ignoring change to photo outside the grid");
                continue;
            };
            let replaced =
                decode_pixbuf(&path).and_then(|pixbuf| self.factory.replace_texture(slot, pixbuf));
            match replaced {
                Ok(true) => {
                    info!(path = %path.display(), "photo reloaded");
                    if self.send(LoaderEvent::Replaced(path)).is_none() {
                        return;
                    }
                }
                Ok(false) => warn!(path = %path.display(), ?slot, "texture slot missing"),
                Err(err) => warn!(path = %path.display(), error = ?err, "reload failed"),
            }
        }
    }
}

fn decode_pixbuf(path: &Path) -> Result<PixelBuffer> {
    let img = decode_rgba8_apply_exif(path)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(PixelBuffer::from_rgba(img))
}

/// Decode to RGBA8 and apply the EXIF orientation, if any.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    Ok(apply_orientation(img, read_orientation(path).unwrap_or(1)))
}

fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270};
    match orientation {
        2 => flip_horizontal(&img),
        3 => rotate180(&img),
        4 => flip_vertical(&img),
        5 => flip_horizontal(&rotate90(&img)),
        6 => rotate90(&img),
        7 => flip_horizontal(&rotate270(&img)),
        8 => rotate270(&img),
        _ => img,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = field.value.get_uint(0)? as u16;
    debug!(orientation = o, path = %path.display(), "exif orientation");
    Some(o)
}
