pub mod layout;
pub mod level_bar;
pub mod slide;
pub mod transform;
