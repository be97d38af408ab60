//! Block-by-block translation of CMS pages with a live preview.
//!
//! - `blocks`: block schema registry and markup helpers
//! - `store`: content store seam and the in-memory store
//! - `session`: translation session for one page
//! - `preview`: preview fragments, documents, and page overview
//! - `highlight`: row hover to preview highlight synchronization

pub mod blocks;
pub mod config;
pub mod error;
pub mod highlight;
pub mod locale;
pub mod metrics;
pub mod notify;
pub mod preview;
pub mod session;
pub mod store;
