pub mod exif;

pub use crate::exif::{load_upright, read_orientation};
