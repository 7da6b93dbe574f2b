pub mod config;
pub mod controller;
pub mod device;
pub mod gesture;
pub mod hand;
pub mod link;
pub mod protocol;
pub mod render;
