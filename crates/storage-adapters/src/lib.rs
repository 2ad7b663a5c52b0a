//! pinpoint/crates/storage-adapters/src/lib.rs
//!
//! In-memory implementations of the Document Store and Blob Store ports.
//! They back the demo binary and the test suites; a cloud-SDK adapter would
//! implement the same traits.

pub mod memory_blobs;
pub mod memory_docs;

pub use memory_blobs::MemoryBlobStore;
pub use memory_docs::MemoryDocumentStore;
