// Domain models, one module per domain

pub mod catalog;
