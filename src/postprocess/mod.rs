pub mod candidates;
pub mod detection;
pub mod nms;
pub mod rescale;
