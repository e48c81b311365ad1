// Catalog Mirror - API Core
//
// This crate provides the backend for a catalog mirror: navigation sections,
// categories, products, and reviews scraped from an external site into a
// local Postgres store, served over a REST API and kept fresh by a
// background scrape worker.
//
// The `server` binary hosts the read API; the `worker` binary drains the
// scrape job queue. The two share no in-memory state.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
