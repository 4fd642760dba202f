//! HTTP API handlers for curio-viewer

pub mod aries;
pub mod buildinfo;
pub mod health;
pub mod oembed;
pub mod ui;
pub mod view;

pub use aries::{aries_lookup, aries_ping};
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use oembed::get_oembed;
pub use ui::{favicon, static_routes};
pub use view::get_view;
