//! Read-only access to produced artifacts.
//!
//! - [`sdist`]: gzip-compressed tar (`.tar.gz`)
//! - [`wheel`]: zip (`.whl`)
//! - [`digest`]: SHA-256 of artifact bytes

pub mod digest;
pub mod sdist;
pub mod wheel;

pub use digest::sha256_file;
pub use sdist::SdistArchive;
pub use wheel::WheelArchive;
