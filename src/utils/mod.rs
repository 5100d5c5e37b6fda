pub mod render;
pub mod rng;

pub use render::{encode_png, save_png};
pub use rng::{RngStream, rng_from_seed};
