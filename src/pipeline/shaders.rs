//! Shader lookup and caching

use std::collections::HashMap;

use crate::backend::{GraphicsBackend, ShaderHandle};

/// Shader programs the pixelization passes draw with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    PixelizationMap,
    ColorPixelize,
    OutlinePixelize,
    Composite,
    CopyDepth,
}

impl ShaderId {
    pub const ALL: [ShaderId; 5] = [
        ShaderId::PixelizationMap,
        ShaderId::ColorPixelize,
        ShaderId::OutlinePixelize,
        ShaderId::Composite,
        ShaderId::CopyDepth,
    ];

    /// Name the host resolves the shader by.
    ///
    /// Color and outline pixelization share one program: both resample a
    /// source through the pixelization map.
    pub fn shader_name(&self) -> &'static str {
        match self {
            ShaderId::PixelizationMap => "Hidden/Pixelsnap/PixelizationMap",
            ShaderId::ColorPixelize | ShaderId::OutlinePixelize => {
                "Hidden/Pixelsnap/ApplyPixelizationMap"
            }
            ShaderId::Composite => "Hidden/Pixelsnap/Composite",
            ShaderId::CopyDepth => "Hidden/Pixelsnap/CopyDepth",
        }
    }

    fn index(&self) -> usize {
        match self {
            ShaderId::PixelizationMap => 0,
            ShaderId::ColorPixelize => 1,
            ShaderId::OutlinePixelize => 2,
            ShaderId::Composite => 3,
            ShaderId::CopyDepth => 4,
        }
    }
}

/// Shader handles resolved for one frame. Missing shaders are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderSet {
    handles: [Option<ShaderHandle>; 5],
}

impl ShaderSet {
    pub fn get(&self, id: ShaderId) -> Option<ShaderHandle> {
        self.handles[id.index()]
    }

    pub fn missing(&self) -> impl Iterator<Item = ShaderId> + '_ {
        ShaderId::ALL.into_iter().filter(|id| self.get(*id).is_none())
    }
}

/// Caches shader lookups by name for the lifetime of a pipeline.
///
/// Each name is looked up on the backend once. A missing shader is
/// reported once and stays missing.
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    cache: HashMap<&'static str, Option<ShaderHandle>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, backend: &mut dyn GraphicsBackend, id: ShaderId) -> Option<ShaderHandle> {
        let name = id.shader_name();
        if let Some(cached) = self.cache.get(name) {
            return *cached;
        }
        let handle = backend.find_shader(name);
        if handle.is_none() {
            log::error!(
                "Shader not found ({name}); the {id:?} stage will pass its input through unchanged"
            );
        }
        self.cache.insert(name, handle);
        handle
    }

    pub fn resolve_all(&mut self, backend: &mut dyn GraphicsBackend) -> ShaderSet {
        let mut set = ShaderSet::default();
        for id in ShaderId::ALL {
            set.handles[id.index()] = self.resolve(backend, id);
        }
        set
    }

    /// Forget cached lookups so the next frame resolves again.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
