//! GPU textures used as offscreen render targets.
//!
//! This module provides [`Texture`], a wrapper around a WGPU texture and its
//! view, and [`RenderTarget`], the color + depth attachment pair every capture
//! frame is rasterized into before it is copied back to the CPU.

use crate::render::Resolution;

/// A GPU texture with its default view.
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// Color format of captured frames. The sRGB variant lets the GPU do the
    /// linear to display conversion, so the bytes read back can be written to
    /// an image file as they are.
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// Unlike an on-screen depth buffer this one is `COPY_SRC` so the depth
    /// of a captured frame can be read back alongside its color.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        Self::create_attachment(device, size, label, Self::DEPTH_FORMAT)
    }

    /// Create an RGBA8 color attachment that can be copied to a buffer.
    pub fn create_color_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        Self::create_attachment(device, size, label, Self::COLOR_FORMAT)
    }

    fn create_attachment(
        device: &wgpu::Device,
        size: [u32; 2],
        label: &str,
        format: wgpu::TextureFormat,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}

/// Color and depth attachments of one resolution plus the row layout used to
/// copy them into mappable buffers.
#[derive(Debug)]
pub struct RenderTarget {
    pub resolution: Resolution,
    pub color: Texture,
    pub depth: Texture,
    /// Bytes per row in the readback buffer, padded to
    /// `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.
    pub padded_bytes_per_row: u32,
}

impl RenderTarget {
    // Both RGBA8 and Depth32Float texels are four bytes wide
    pub const BYTES_PER_PIXEL: u32 = 4;

    pub fn new(device: &wgpu::Device, resolution: Resolution) -> Self {
        let size = [resolution.width, resolution.height];
        let color = Texture::create_color_texture(device, size, "capture_color_texture");
        let depth = Texture::create_depth_texture(device, size, "capture_depth_texture");
        Self {
            resolution,
            color,
            depth,
            padded_bytes_per_row: padded_bytes_per_row(resolution.width),
        }
    }

    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.resolution.width,
            height: self.resolution.height,
            depth_or_array_layers: 1,
        }
    }

    pub fn readback_size(&self) -> wgpu::BufferAddress {
        u64::from(self.padded_bytes_per_row) * u64::from(self.resolution.height)
    }
}

/// Copies between textures and buffers need rows aligned to 256 bytes.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * RenderTarget::BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the row padding of a readback buffer.
pub fn strip_row_padding(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<u8> {
    let row_bytes = (width * RenderTarget::BYTES_PER_PIXEL) as usize;
    data.chunks(padded_bytes_per_row as usize)
        .take(height as usize)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect()
}
