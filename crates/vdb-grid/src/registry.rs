//! Process-wide registry of grid value types known to the stream codec.

use std::sync::OnceLock;

use tracing::debug;

use crate::grid::GridValue;

static REGISTRY: OnceLock<GridTypeRegistry> = OnceLock::new();

/// The set of grid type names the stream codec can decode.
#[derive(Debug)]
pub struct GridTypeRegistry {
    names: Vec<&'static str>,
}

impl GridTypeRegistry {
    /// Whether grids of this type name can be read.
    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.names.contains(&type_name)
    }

    /// All registered type names.
    #[must_use]
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }
}

/// Registers the built-in grid types. Safe to call any number of times.
///
/// Stream reads and writes call this implicitly; calling it at startup
/// only moves the one-time cost.
///
/// # Example
///
/// ```
/// let registry = vdb_grid::initialize();
/// assert!(registry.is_registered("float"));
/// assert!(vdb_grid::is_initialized());
/// assert!(std::ptr::eq(registry, vdb_grid::initialize()));
/// ```
pub fn initialize() -> &'static GridTypeRegistry {
    REGISTRY.get_or_init(|| {
        let names = vec![<f32 as GridValue>::TYPE_NAME, <i32 as GridValue>::TYPE_NAME];
        debug!(?names, "registered grid types");
        GridTypeRegistry { names }
    })
}

/// Whether [`initialize`] has run in this process.
#[must_use]
pub fn is_initialized() -> bool {
    REGISTRY.get().is_some()
}
