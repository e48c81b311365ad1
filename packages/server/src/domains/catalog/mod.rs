//! Catalog domain - mirrored navigation sections, categories, products,
//! details, reviews, and session view history.

pub mod models;
