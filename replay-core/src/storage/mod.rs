pub mod backing;
pub mod framing;
pub mod section;
pub mod segment_store;
