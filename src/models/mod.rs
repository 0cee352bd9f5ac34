pub mod image;
pub mod metadata;
pub mod storage;

pub use image::*;
pub use metadata::*;
pub use storage::*;
