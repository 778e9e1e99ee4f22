// src/ui/widgets/mod.rs

// Declare all of our widget modules here.
pub mod analysis_view; // Detail view of the selected domain and its findings.
pub mod disclaimer_popup;
pub mod footer;
pub mod input;
pub mod log_view; // Live progress of the running batch.
pub mod results; // One row per scanned domain.
pub mod summary;
