//! Rick and Morty mirror library
//!
//! Fetches the paginated character collection, keeps the records that have a
//! name, a location name and an avatar, caches the result on disk and serves
//! it over HTTP.

pub mod cache;
pub mod cli;
pub mod data;
pub mod server;
pub mod service;
