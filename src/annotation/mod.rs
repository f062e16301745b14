//! Annotation subsystem: shapes, the per-image store, gesture tracking,
//! overlay rendering, and sidecar persistence.

pub mod gesture;
pub mod render;
pub mod shape;
pub mod sidecar;
pub mod store;
