//! Lazy evaluation options.
//!
//! Options are read from the calling thread each time a lazy node is built.
//! Use [`with_options`] to change them for a scope:
//!
//! ```
//! use kira_vecteur::config::{self, LazyOptions};
//!
//! let opts = LazyOptions::default().with_fuse_multiply_add(false);
//! config::with_options(opts, || {
//!     assert!(!config::current().fuse_multiply_add);
//! });
//! assert!(config::current().fuse_multiply_add);
//! ```

use std::cell::Cell;

use serde::{Deserialize, Serialize};

/// Options controlling how lazy expressions are built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyOptions {
    /// Operands at least this tall are evaluated into the leaf arena when
    /// they become a child of a new node. Values below 2 act as 2.
    pub collapse_height: usize,
    /// Rewrite `(a * b) + c` into a fused multiply-add node.
    pub fuse_multiply_add: bool,
}

impl LazyOptions {
    /// Default collapse height.
    pub const DEFAULT_COLLAPSE_HEIGHT: usize = 4;

    /// The default options.
    pub const DEFAULT: LazyOptions = LazyOptions {
        collapse_height: Self::DEFAULT_COLLAPSE_HEIGHT,
        fuse_multiply_add: true,
    };

    /// Sets the collapse height.
    #[must_use]
    pub const fn with_collapse_height(self, collapse_height: usize) -> Self {
        LazyOptions {
            collapse_height,
            ..self
        }
    }

    /// Enables or disables the fused multiply-add rewrite.
    #[must_use]
    pub const fn with_fuse_multiply_add(self, fuse_multiply_add: bool) -> Self {
        LazyOptions {
            fuse_multiply_add,
            ..self
        }
    }

    /// The collapse height actually applied. Leaves never collapse.
    #[must_use]
    pub const fn effective_collapse_height(&self) -> usize {
        if self.collapse_height < 2 {
            2
        } else {
            self.collapse_height
        }
    }
}

impl Default for LazyOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

thread_local! {
    static CURRENT: Cell<LazyOptions> = const { Cell::new(LazyOptions::DEFAULT) };
}

/// Options in effect on this thread.
pub fn current() -> LazyOptions {
    CURRENT.with(Cell::get)
}

/// Run `f` with `options` in effect on this thread.
///
/// The previous options are restored when `f` returns or unwinds.
pub fn with_options<F, R>(options: LazyOptions, f: F) -> R
where
    F: FnOnce() -> R,
{
    struct Restore(LazyOptions);

    impl Drop for Restore {
        fn drop(&mut self) {
            CURRENT.with(|current| current.set(self.0));
        }
    }

    let _restore = Restore(CURRENT.with(|current| current.replace(options)));
    f()
}
