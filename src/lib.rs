pub mod access;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod dashboard;
pub mod enrollment;
pub mod error;
pub mod models;
pub mod navigation;
pub mod progress;
pub mod routes;
pub mod scorm;
pub mod sessions;
pub mod tree;
