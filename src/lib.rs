pub mod app;
pub mod cache;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod markup;
pub mod report;
pub mod search;
pub mod tree;
