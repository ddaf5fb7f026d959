pub mod format;
pub mod watcher;
