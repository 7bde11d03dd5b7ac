pub mod catalog;
pub mod classifier;
pub mod content;
pub mod debounce;
pub mod live;
pub mod paginator;
pub mod reader;
pub mod session;
