pub mod ai;
pub mod gui;
pub mod mindmap;
pub mod persistence;
pub mod store;
pub mod viewport;
