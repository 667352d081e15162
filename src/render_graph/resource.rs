//! Frame-scoped resources for the pixelization pass sequence

use std::collections::{HashMap, HashSet};

use crate::backend::traits::*;
use crate::backend::types::*;

/// Named resource slot.
///
/// The set of slots is fixed: every frame acquires the same render targets
/// at the camera's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceSlot {
    /// The camera's live color target (owned by the host)
    CameraColor,
    /// Point-filtered copy of the shaded scene
    OriginalScene,
    /// Per-pixel lookup of how source texels collapse into output pixels
    PixelizationMap,
    /// Pixelized color with co-located pixelized depth
    PixelatedScene,
    /// Camera depth attachment rewritten with pixelized depth
    DepthAttachment,
    /// Pixelized depth reconstructed by a full-screen pass
    DepthAttachmentTemp,
    /// Raw outline metadata (per-object ids)
    OutlinesTemp,
    /// Pixelized outline metadata
    Outlines,
    /// Scene depth read by downstream stages; outlives the frame
    SceneDepth,
}

impl ResourceSlot {
    /// Slots acquired from the backend during configure, in acquisition order.
    pub const ACQUIRED: [ResourceSlot; 8] = [
        ResourceSlot::PixelatedScene,
        ResourceSlot::OriginalScene,
        ResourceSlot::DepthAttachment,
        ResourceSlot::DepthAttachmentTemp,
        ResourceSlot::Outlines,
        ResourceSlot::OutlinesTemp,
        ResourceSlot::PixelizationMap,
        ResourceSlot::SceneDepth,
    ];

    /// Shader-visible name of the slot.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceSlot::CameraColor => "_CameraColorTexture",
            ResourceSlot::OriginalScene => "_OriginalScene",
            ResourceSlot::PixelizationMap => "_PixelizationMap",
            ResourceSlot::PixelatedScene => "_PixelatedScene",
            ResourceSlot::DepthAttachment => "_CameraDepthAttachment",
            ResourceSlot::DepthAttachmentTemp => "_CameraDepthAttachmentTemp",
            ResourceSlot::OutlinesTemp => "_OutlinesTemp",
            ResourceSlot::Outlines => "_Outlines",
            ResourceSlot::SceneDepth => "_CameraDepthTexture",
        }
    }

    /// Provided by the host rather than acquired.
    pub fn is_external(&self) -> bool {
        matches!(self, ResourceSlot::CameraColor)
    }

    /// Survives the cleanup of the frame that acquired it.
    pub fn is_persistent(&self) -> bool {
        matches!(self, ResourceSlot::SceneDepth)
    }

    /// Descriptor for this slot derived from the camera target.
    pub fn descriptor(&self, camera: &CameraTarget) -> TextureDescriptor {
        let base = TextureDescriptor {
            label: Some(self.name().to_string()),
            width: camera.width,
            height: camera.height,
            format: camera.format,
            depth_format: None,
            filter: FilterMode::Linear,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
        };
        match self {
            ResourceSlot::CameraColor | ResourceSlot::PixelatedScene => {
                base.with_depth(Some(camera.depth_format))
            }
            ResourceSlot::OriginalScene => base.with_filter(FilterMode::Nearest),
            ResourceSlot::DepthAttachment
            | ResourceSlot::DepthAttachmentTemp
            | ResourceSlot::SceneDepth => base.with_format(camera.depth_format),
            ResourceSlot::Outlines | ResourceSlot::OutlinesTemp => base
                .with_format(TextureFormat::Rgba8Unorm)
                .with_filter(FilterMode::Nearest),
            ResourceSlot::PixelizationMap => base.with_format(TextureFormat::Rgba8Unorm),
        }
    }
}

/// The camera's render target for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub color: TextureHandle,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub depth_format: TextureFormat,
}

impl CameraTarget {
    pub fn new(color: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            color,
            width,
            height,
            format: TextureFormat::Rgba8UnormSrgb,
            depth_format: TextureFormat::Depth32Float,
        }
    }
}

/// How a pass uses a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUsage {
    /// Read as a texture (sampled)
    TextureRead,
    /// Depth aspect read as a texture
    DepthRead,
    /// Write as a render target
    RenderTarget,
    /// Depth attachment write
    DepthStencilWrite,
}

/// Resource access declaration for a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAccess {
    pub resource: ResourceSlot,
    pub usage: ResourceUsage,
}

impl ResourceAccess {
    pub fn is_read(&self) -> bool {
        matches!(
            self.usage,
            ResourceUsage::TextureRead | ResourceUsage::DepthRead
        )
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self.usage,
            ResourceUsage::RenderTarget | ResourceUsage::DepthStencilWrite
        )
    }
}

/// Textures bound to slots for one frame.
///
/// Created by [`FrameResources::acquire`] during configure and consumed by
/// [`FrameResources::release`] during cleanup.
#[derive(Debug, Default)]
pub struct FrameResources {
    textures: HashMap<ResourceSlot, TextureHandle>,
    written: HashSet<ResourceSlot>,
}

impl FrameResources {
    /// Acquire every slot in [`ResourceSlot::ACQUIRED`].
    ///
    /// On failure the slots acquired so far are released again.
    pub fn acquire<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        camera: &CameraTarget,
    ) -> BackendResult<Self> {
        let mut resources = Self::default();
        resources
            .textures
            .insert(ResourceSlot::CameraColor, camera.color);
        resources.written.insert(ResourceSlot::CameraColor);

        for slot in ResourceSlot::ACQUIRED {
            match backend.acquire_texture(&slot.descriptor(camera)) {
                Ok(handle) => {
                    resources.textures.insert(slot, handle);
                }
                Err(err) => {
                    log::error!("Failed to acquire {}: {err}", slot.name());
                    resources.release_all(backend);
                    return Err(err);
                }
            }
        }
        Ok(resources)
    }

    /// Texture bound to a slot, written or not.
    pub fn get(&self, slot: ResourceSlot) -> Option<TextureHandle> {
        self.textures.get(&slot).copied()
    }

    pub fn mark_written(&mut self, slot: ResourceSlot) {
        self.written.insert(slot);
    }

    pub fn is_written(&self, slot: ResourceSlot) -> bool {
        self.written.contains(&slot)
    }

    /// Number of acquired (non-external) slots currently held.
    pub fn acquired_len(&self) -> usize {
        self.textures.keys().filter(|s| !s.is_external()).count()
    }

    /// Release all transient slots and hand back the persistent one.
    pub fn release<B: GraphicsBackend + ?Sized>(mut self, backend: &mut B) -> Option<TextureHandle> {
        let persistent = self.textures.remove(&ResourceSlot::SceneDepth);
        self.release_all(backend);
        persistent
    }

    fn release_all<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        // Reverse acquisition order
        for slot in ResourceSlot::ACQUIRED.iter().rev() {
            if let Some(handle) = self.textures.remove(slot) {
                log::trace!("Releasing {}", slot.name());
                backend.release_texture(handle);
            }
        }
        self.textures.clear();
        self.written.clear();
    }
}
