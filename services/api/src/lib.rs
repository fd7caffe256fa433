pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod web;
