pub mod anchors;
pub mod scatter;
