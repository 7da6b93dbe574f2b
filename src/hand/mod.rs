pub mod detector;
pub mod keypoint;
pub mod source;

pub use detector::HandDetector;
pub use keypoint::{Hand, HandKeypointIndex, Keypoint};
pub use source::{HandInput, ThreadedHandSource};
