pub mod config;
pub mod content;
pub mod document;
pub mod publish;
pub mod render;
pub mod route;
pub mod signal;
pub mod storage;
pub mod theme;
pub mod timer;
pub mod transition;
pub mod view;
pub mod weather;
