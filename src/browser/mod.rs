//! Browser integration
//!
//! Launching or attaching to Chrome, snapshotting the rendered document into a
//! [`DomTree`](crate::dom::DomTree), and driving live scroll containers.

pub mod config;
pub mod session;
pub mod surface;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
pub use surface::TabScrollSurface;
