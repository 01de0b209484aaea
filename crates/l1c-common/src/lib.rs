//! Common types shared across the level-1c workspace.
//!
//! The scene model here is the boundary between the external reader, the
//! geometry/normalization pipeline and the external writer.

pub mod attrs;
pub mod error;
pub mod scene;
pub mod time;

pub use attrs::{AttrValue, Attributes};
pub use error::{SceneError, SceneResult};
pub use scene::{Band, Coordinates, Scene};
pub use time::{date_created, header_time, parse_slot_key, pps_filename_time, slot_key};
