pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod paint;
pub mod pixbuf;
pub mod scan;
pub mod timer;
pub mod widget;
pub mod render {
    pub mod gpu;
    pub mod viewer;
}
pub mod tasks {
    pub mod loader;
    pub mod watch;
}

pub use config::Configuration;
pub use error::Error;
pub use grid::PhotoGrid;
pub use render::viewer::run_grid;
