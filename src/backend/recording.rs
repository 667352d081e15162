//! Recording backend for testing and headless hosts.
//!
//! This backend doesn't perform GPU work. It records every command it
//! receives and tracks texture lifetimes, so frame structure can be
//! inspected without GPU hardware.

use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec4};

use crate::backend::traits::*;
use crate::backend::types::*;

/// A command received by the [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AcquireTexture {
        texture: TextureHandle,
        label: Option<String>,
    },
    ReleaseTexture(TextureHandle),
    SetKeyword {
        shader: ShaderHandle,
        keyword: String,
        enabled: bool,
    },
    SetFloat {
        shader: ShaderHandle,
        name: String,
        value: f32,
    },
    SetGlobalTexture {
        name: String,
        binding: TextureBinding,
    },
    SetGlobalVector {
        name: String,
        value: Vec4,
    },
    WriteUniform {
        name: String,
        data: Vec<u8>,
    },
    SetViewProjection {
        view: Mat4,
        projection: Mat4,
    },
    BeginRenderPass(RenderPassDescriptor),
    EndRenderPass,
    Blit {
        source: TextureBinding,
        target: TextureHandle,
        shader: Option<ShaderHandle>,
    },
    DrawFullscreen(ShaderHandle),
    DrawTagged(String),
}

/// Backend that records commands instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    live: HashMap<TextureHandle, TextureDescriptor>,
    shaders: HashMap<String, ShaderHandle>,
    missing_shaders: HashSet<String>,
    shader_lookups: usize,
    acquired: usize,
    released: usize,
    invalid_releases: usize,
    fail_acquire_after: Option<usize>,
    next_id: u64,
}

impl RecordingBackend {
    /// Create a new recording backend where every shader resolves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Recording Backend"
    }

    /// Make lookups of `name` fail.
    pub fn with_missing_shader(mut self, name: &str) -> Self {
        self.missing_shaders.insert(name.to_string());
        self
    }

    /// Fail every texture acquisition after `count` successful ones.
    pub fn fail_acquire_after(&mut self, count: usize) {
        self.fail_acquire_after = Some(self.acquired + count);
    }

    /// Register a host-owned texture (e.g. the camera color target).
    pub fn create_external_texture(&mut self, label: &str) -> TextureHandle {
        let handle = TextureHandle(self.alloc_id());
        log::trace!("RecordingBackend: external texture {label} -> {handle:?}");
        handle
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drop recorded commands, keeping lifetime bookkeeping.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Textures acquired and not yet released.
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, texture: TextureHandle) -> bool {
        self.live.contains_key(&texture)
    }

    pub fn descriptor(&self, texture: TextureHandle) -> Option<&TextureDescriptor> {
        self.live.get(&texture)
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired
    }

    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Releases of handles that were not live.
    pub fn invalid_releases(&self) -> usize {
        self.invalid_releases
    }

    pub fn shader_lookups(&self) -> usize {
        self.shader_lookups
    }

    /// Name under which `shader` was resolved.
    pub fn shader_name(&self, shader: ShaderHandle) -> Option<&str> {
        self.shaders
            .iter()
            .find(|(_, &h)| h == shader)
            .map(|(name, _)| name.as_str())
    }

    /// Last state recorded for a keyword on a shader.
    pub fn keyword_state(&self, shader: ShaderHandle, keyword: &str) -> Option<bool> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetKeyword {
                shader: s,
                keyword: k,
                enabled,
            } if *s == shader && k == keyword => Some(*enabled),
            _ => None,
        })
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for RecordingBackend {
    fn acquire_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        if let Some(limit) = self.fail_acquire_after {
            if self.acquired >= limit {
                return Err(BackendError::TextureCreationFailed(
                    desc.label.clone().unwrap_or_default(),
                ));
            }
        }
        let handle = TextureHandle(self.alloc_id());
        log::trace!(
            "RecordingBackend: acquiring texture {:?} ({}x{})",
            desc.label,
            desc.width,
            desc.height
        );
        self.live.insert(handle, desc.clone());
        self.acquired += 1;
        self.commands.push(Command::AcquireTexture {
            texture: handle,
            label: desc.label.clone(),
        });
        Ok(handle)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.live.remove(&texture).is_some() {
            self.released += 1;
        } else {
            log::warn!("RecordingBackend: release of unknown texture {texture:?}");
            self.invalid_releases += 1;
        }
        self.commands.push(Command::ReleaseTexture(texture));
    }

    fn find_shader(&mut self, name: &str) -> Option<ShaderHandle> {
        self.shader_lookups += 1;
        if self.missing_shaders.contains(name) {
            return None;
        }
        if let Some(&handle) = self.shaders.get(name) {
            return Some(handle);
        }
        let handle = ShaderHandle(self.alloc_id());
        self.shaders.insert(name.to_string(), handle);
        Some(handle)
    }

    fn set_shader_keyword(&mut self, shader: ShaderHandle, keyword: &str, enabled: bool) {
        self.commands.push(Command::SetKeyword {
            shader,
            keyword: keyword.to_string(),
            enabled,
        });
    }

    fn set_shader_float(&mut self, shader: ShaderHandle, name: &str, value: f32) {
        self.commands.push(Command::SetFloat {
            shader,
            name: name.to_string(),
            value,
        });
    }

    fn set_global_texture(&mut self, name: &str, binding: TextureBinding) {
        self.commands.push(Command::SetGlobalTexture {
            name: name.to_string(),
            binding,
        });
    }

    fn set_global_vector(&mut self, name: &str, value: Vec4) {
        self.commands.push(Command::SetGlobalVector {
            name: name.to_string(),
            value,
        });
    }

    fn write_uniform(&mut self, name: &str, data: &[u8]) {
        self.commands.push(Command::WriteUniform {
            name: name.to_string(),
            data: data.to_vec(),
        });
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.commands
            .push(Command::SetViewProjection { view, projection });
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.commands.push(Command::BeginRenderPass(desc.clone()));
    }

    fn end_render_pass(&mut self) {
        self.commands.push(Command::EndRenderPass);
    }

    fn blit(&mut self, source: TextureBinding, target: TextureHandle, shader: Option<ShaderHandle>) {
        self.commands.push(Command::Blit {
            source,
            target,
            shader,
        });
    }

    fn draw_fullscreen(&mut self, shader: ShaderHandle) {
        self.commands.push(Command::DrawFullscreen(shader));
    }

    fn draw_tagged_renderers(&mut self, tag: &str) {
        self.commands.push(Command::DrawTagged(tag.to_string()));
    }
}
