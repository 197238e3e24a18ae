pub mod annotation;
pub mod app;
pub mod compare;
pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod merge;
pub mod output;
pub mod parser;
pub mod reshape;
pub mod select;
pub mod store;
pub mod time;
