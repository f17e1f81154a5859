//! Global platform registry for looking up platform definitions.

use std::sync::LazyLock;

use indexmap::IndexMap;

use super::definition::PlatformDefinition;
use super::{DeviceKind, vendors};

/// Built-in platforms, created on first use.
static REGISTRY: LazyLock<PlatformRegistry> = LazyLock::new(PlatformRegistry::builtin);

/// Registry for platform definitions.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: IndexMap<DeviceKind, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: IndexMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static PlatformRegistry {
        &REGISTRY
    }

    /// A registry holding every built-in platform.
    fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(vendors::cisco_ios::platform());
        registry
    }

    /// Register a platform definition, replacing one of the same kind.
    pub fn register(&mut self, platform: PlatformDefinition) {
        self.platforms.insert(platform.kind, platform);
    }

    /// Get a platform by kind.
    pub fn get(&self, kind: DeviceKind) -> Option<&PlatformDefinition> {
        self.platforms.get(&kind)
    }

    /// List all registered kinds.
    pub fn kinds(&self) -> impl Iterator<Item = &DeviceKind> {
        self.platforms.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_builtin_platform() {
        let registry = PlatformRegistry::global();
        for kind in DeviceKind::ALL {
            let platform = registry.get(*kind).unwrap();
            assert_eq!(platform.kind, *kind);
        }
        assert_eq!(registry.kinds().count(), DeviceKind::ALL.len());
    }
}
