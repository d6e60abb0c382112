//! Content loader for remote mode.
//!
//! Renders a locator in a browsing surface with bounded automatic retries.
//! When retries run out the host is told, once, to fall back to native.

mod driver;
mod state;
mod surface;

#[cfg(test)]
pub mod testing;

pub use driver::{mount, LoaderExit, LoaderHandle, LoaderOptions};
pub use state::LoaderState;
pub use surface::{HttpSurfaceFactory, SurfaceFactory};
