use std::path::PathBuf;

use crate::grid::Cell;

/// Messages from the loader thread to the UI loop.
#[derive(Debug)]
pub enum LoaderEvent {
    /// A fully built cell, texture already uploaded, ready to append.
    Cell { path: PathBuf, cell: Cell },
    /// Every scanned photo has been offered to the grid.
    Populated { loaded: usize, skipped: usize },
    /// A watched photo changed and its texture was swapped in place.
    Replaced(PathBuf),
}

/// A file below the photo library changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoModified(pub PathBuf);
