use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher,
    event::{CreateKind, ModifyKind, RenameMode},
};
use tracing::{debug, warn};

use crate::events::PhotoModified;
use crate::scan::is_supported_image;

/// Watch `root` recursively and forward image files whose contents changed.
/// The watcher stops when the returned handle is dropped.
pub fn start_watcher(root: &Path, tx: Sender<PhotoModified>) -> NotifyResult<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for path in modified_images(event) {
                if tx.send(PhotoModified(path)).is_err() {
                    debug!("loader gone; dropping watch event");
                    return;
                }
            }
        }
        Err(err) => warn!(error = %err, "watch error"),
    })?;

    watcher.configure(Config::default())?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    debug!(root = %root.display(), "watching photo library");
    Ok(watcher)
}

/// Paths in `event` that now hold new image data. Editors either rewrite in
/// place or write a sibling and rename it over the original; both count.
fn modified_images(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::File)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .into_iter()
            .filter(|p| is_image_file(p))
            .collect(),
        _ => Vec::new(),
    }
}

fn is_image_file(p: &Path) -> bool {
    std::fs::metadata(p).map(|m| m.is_file()).unwrap_or(false) && is_supported_image(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, RemoveKind};

    #[test]
    fn forwards_rewritten_images_only() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("a.jpg");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&photo, b"x").unwrap();
        std::fs::write(&notes, b"x").unwrap();

        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(photo.clone())
            .add_path(notes);
        assert_eq!(modified_images(event), vec![photo.clone()]);

        let renamed =
            Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To))).add_path(photo.clone());
        assert_eq!(modified_images(renamed), vec![photo.clone()]);

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(photo);
        assert!(modified_images(removed).is_empty());
    }

    #[test]
    fn ignores_vanished_files() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.png");
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(gone);
        assert!(modified_images(event).is_empty());
    }
}
