//! Layout management: region trees, tile placement and timers.
//!
//! The `tree` module turns a layout family and slot count into a binary
//! region tree and assigns each leaf a rectangle. The `manager` module owns
//! the tiles built on those leaves, focus, and rebuilds. The `timer` module
//! schedules tick and cycle timers for every tile.

pub mod manager;
pub mod timer;
pub mod tree;

pub use manager::WindowManager;
