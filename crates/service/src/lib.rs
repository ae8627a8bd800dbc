//! Translation job over locale catalogs.
//! - `storage` reads and rewrites catalog files.
//! - `translator` is the seam to the language-model API.
//! - `job` walks the untranslated keys one by one and persists the result.

pub mod errors;
pub mod storage;
pub mod translator;
pub mod job;
