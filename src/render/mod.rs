pub mod canvas;
pub mod skeleton;
pub mod view;
#[cfg(feature = "desktop")]
pub mod window;

pub use canvas::Canvas;
pub use skeleton::HAND_CONNECTIONS;
pub use view::{StatusView, ViewState, WindowEvent};
#[cfg(feature = "desktop")]
pub use window::MinifbRenderer;
