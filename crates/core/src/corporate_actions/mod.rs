//! Corporate actions module - split ratio detection and share rescaling.

mod split_processor;

pub use split_processor::*;
