pub mod app;
pub mod host;
pub mod menu;
pub mod theme;
pub mod window;
