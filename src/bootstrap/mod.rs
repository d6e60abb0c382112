//! Launch-time mode resolution.
//!
//! The resolver queries a remote flag and, when it is set, a locator for the
//! remote destination. Any failure degrades to native mode.

mod locator;
mod resolver;


pub use locator::Locator;
pub use resolver::{ModeResolver, ResolutionOutcome};
