pub mod catalog;
pub mod read;
pub mod render;
