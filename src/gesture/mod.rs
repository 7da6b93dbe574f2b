pub mod extent;
pub mod mode;
pub mod slide;
pub mod toggle;

pub use extent::{classify_tip, TipPosition};
pub use mode::classify_mode;
pub use slide::SlideAdjuster;
pub use toggle::TwoHandToggle;
