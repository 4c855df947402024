pub mod client;
pub mod config;
pub mod download;
pub mod editor;
pub mod service;

pub use draftdesk_core as models;
