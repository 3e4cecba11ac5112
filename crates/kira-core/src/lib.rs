//! Kira Core - support utilities shared by the kira libraries
//!
//! Currently this is the [`FileResolver`], an ordered list of search
//! directories used to locate data files by relative path.
//!
//! ```no_run
//! use kira_core::FileResolver;
//!
//! let mut resolver = FileResolver::new()?;
//! resolver.append("assets");
//! let mesh = resolver.resolve("meshes/bunny.obj");
//! # Ok::<(), kira_core::CoreError>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod resolver;

pub use error::{CoreError, Result};
pub use resolver::FileResolver;
