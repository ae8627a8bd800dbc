//! Storage for locale catalogs
//!
//! Catalog files are flat JSON objects owned by the extraction tooling;
//! they are read and rewritten wholesale.

pub mod catalog_store;
