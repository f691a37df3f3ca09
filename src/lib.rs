#![forbid(unsafe_code)]
//! PEP 517/518 Packaging Verification Harness
//!
//! Drives an external packaging frontend (`python -m build`, `pip install`) against a fixed
//! native-extension sample project and verifies what comes out: artifact names, archive
//! members, content hashes, embedded core metadata, and the behavior of the installed package.
//!
//! The harness builds nothing itself. The build backend, the compiler, and the archive
//! producers are black boxes reached through subprocesses.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli`, `checks`, and
//!   `process` modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Verification failures** are values (`HarnessError::Mismatch`), never panics, so the runner can
//!   report every check in a session.

pub mod archive;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod frontend;
pub mod interpreter;
pub mod metadata;
pub mod process;
pub mod project;
pub mod settings;
pub mod venv;
pub mod version;

pub use checks::{Check, CheckContext, CheckReport, Marker};
pub use config::{Expectations, HarnessConfig, SdistHashes};
pub use error::{HarnessError, HarnessResult};
pub use interpreter::{Interpreter, PythonVersion};
pub use project::SampleProject;
