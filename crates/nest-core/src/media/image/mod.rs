mod edges;
mod lsb_codec;

pub use edges::{EdgeDetector, EdgeMask};
pub use lsb_codec::ImageCarrier;
