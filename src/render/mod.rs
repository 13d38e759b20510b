//! Drawing surfaces the frame controller paints onto.

pub(crate) mod composite;
/// Surface capability traits and the in-memory raster surface.
pub mod surface;
