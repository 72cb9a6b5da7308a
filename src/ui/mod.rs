//! Terminal rendering for load progress and results
//!
//! Both views are drawn into inline ratatui viewports so they sit in the
//! normal terminal scrollback instead of taking over the screen.

pub mod progress_gauge;
pub mod summary_table;

pub use progress_gauge::render as render_progress;
pub use summary_table::render as render_summary;
