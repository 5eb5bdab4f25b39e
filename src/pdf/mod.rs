pub mod compose;
pub mod document;
pub mod raster;

#[cfg(test)]
pub(crate) mod fixtures;

pub use compose::{
    compose_from_concatenation, compose_from_images, compose_from_selection, Composition,
    CompositionReport,
};
pub use document::{DocumentInput, SourceDocument};
pub use raster::ImageInput;
