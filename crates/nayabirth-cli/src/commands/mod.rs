pub mod checklist;
pub mod config;
pub mod contraction;
pub mod kick;
pub mod plan;
pub mod timeline;
