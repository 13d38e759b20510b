//! Frame image decoding and path hygiene shared by the frame loaders.

pub(crate) mod decode;
pub(crate) mod path;
