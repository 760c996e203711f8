//! Integration tests exercising whole request paths over mock transports.

pub mod adapters;
