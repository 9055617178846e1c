//! The scene renderer boundary and its wgpu implementation.
//!
//! The capture pipeline only talks to a [`SceneRenderer`]: upload a mesh once,
//! then rasterize the scene with its attached camera once per frame. The GPU
//! implementation is [`OffscreenRenderer`]; tests substitute CPU fakes.
//!
//! # Key types
//!
//! - [`Resolution`] is the size of every captured frame
//! - [`RenderedFrame`] is the color buffer (RGBA8) plus the depth buffer
//! - [`SceneRenderer`] is the renderer contract
//! - [`OffscreenRenderer`] renders into textures and copies them back

use std::{fmt, iter, str::FromStr, time::Duration};

use anyhow::{Context as _, anyhow, bail};
use tokio::runtime::Runtime;

use crate::{
    context::Context,
    data_structures::{
        geometry::MeshGeometry,
        model::{DrawMesh, Mesh},
        texture::{RenderTarget, strip_row_padding},
    },
    scene::Scene,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `800x800`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension {:?} in {:?}: {}", v, s, e))
        };
        Ok(Self::new(parse(width)?, parse(height)?))
    }
}

/// Output of one render call.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub color: image::RgbaImage,
    /// Row-major depth values, one per pixel. Not used by the manifest.
    pub depth: Vec<f32>,
}

impl RenderedFrame {
    pub fn resolution(&self) -> Resolution {
        let (width, height) = self.color.dimensions();
        Resolution::new(width, height)
    }
}

/// Rasterizes a [`Scene`] with exactly one attached camera.
///
/// Implementations must not keep per-frame state in the scene: cameras are
/// attached and detached by the caller between calls.
pub trait SceneRenderer {
    /// Renderer-side handle of an uploaded mesh.
    type Mesh;

    fn upload(&mut self, geometry: &MeshGeometry) -> anyhow::Result<Self::Mesh>;

    fn render(
        &mut self,
        scene: &Scene<Self::Mesh>,
        resolution: Resolution,
    ) -> anyhow::Result<RenderedFrame>;
}

/// wgpu renderer drawing into offscreen textures.
///
/// Owns its own async runtime to drive device creation and buffer mapping,
/// so it can be used from synchronous code.
pub struct OffscreenRenderer {
    async_runtime: Runtime,
    ctx: Context,
    target: Option<RenderTarget>,
}

impl OffscreenRenderer {
    pub fn new() -> anyhow::Result<Self> {
        let async_runtime = Runtime::new().context("failed to start async runtime")?;
        let ctx = async_runtime.block_on(Context::new())?;
        Ok(Self {
            async_runtime,
            ctx,
            target: None,
        })
    }

    fn ensure_target(&mut self, resolution: Resolution) {
        let stale = self
            .target
            .as_ref()
            .is_none_or(|target| target.resolution != resolution);
        if stale {
            log::debug!("allocating {} render target", resolution);
            self.target = Some(RenderTarget::new(&self.ctx.device, resolution));
        }
    }
}

impl SceneRenderer for OffscreenRenderer {
    type Mesh = Mesh;

    fn upload(&mut self, geometry: &MeshGeometry) -> anyhow::Result<Mesh> {
        if geometry.vertices.is_empty() {
            bail!("mesh has no vertices");
        }
        if let Some(face) = geometry.first_invalid_face() {
            bail!("face {} references a vertex that does not exist", face);
        }
        Ok(Mesh::from_geometry(&self.ctx.device, geometry, "capture_mesh"))
    }

    fn render(&mut self, scene: &Scene<Mesh>, resolution: Resolution) -> anyhow::Result<RenderedFrame> {
        let camera = *scene
            .camera()
            .ok_or_else(|| anyhow!("no camera attached to the scene"))?;
        self.ctx.write_scene(scene, &camera);
        self.ensure_target(resolution);
        let ctx = &self.ctx;
        let Some(target) = &self.target else {
            bail!("render target missing");
        };

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Capture Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&ctx.pipeline);
            render_pass.draw_mesh(scene.mesh(), &ctx.camera.bind_group, &ctx.light.bind_group);
        }

        let buffer_size = target.readback_size();
        let mk_readback = |label: &str| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: buffer_size,
                // this tells wpgu that we want to read this buffer from the cpu
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        };
        let color_buffer = mk_readback("Color Readback Buffer");
        let depth_buffer = mk_readback("Depth Readback Buffer");

        for (texture, aspect, buffer) in [
            (&target.color.texture, wgpu::TextureAspect::All, &color_buffer),
            (&target.depth.texture, wgpu::TextureAspect::DepthOnly, &depth_buffer),
        ] {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect,
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(target.padded_bytes_per_row),
                        rows_per_image: Some(resolution.height),
                    },
                },
                target.extent(),
            );
        }

        ctx.queue.submit(iter::once(encoder.finish()));

        let (color, depth) = self.async_runtime.block_on(async {
            let color = read_buffer(&ctx.device, &color_buffer).await?;
            let depth = read_buffer(&ctx.device, &depth_buffer).await?;
            anyhow::Ok((color, depth))
        })?;

        let Resolution { width, height } = resolution;
        let color = strip_row_padding(&color, width, height, target.padded_bytes_per_row);
        let color = image::RgbaImage::from_raw(width, height, color)
            .context("color readback does not match the target size")?;
        let depth = strip_row_padding(&depth, width, height, target.padded_bytes_per_row)
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(RenderedFrame { color, depth })
    }
}

async fn read_buffer(device: &wgpu::Device, buffer: &wgpu::Buffer) -> anyhow::Result<Vec<u8>> {
    // NOTE: the mapping has to be requested before polling, otherwise the
    // future never resolves.
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(10)),
        })
        .context("GPU did not finish the frame")?;
    rx.receive()
        .await
        .context("readback mapping was dropped")?
        .context("failed to map readback buffer")?;

    let data = buffer_slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_resolution() {
        assert_eq!("800x600".parse::<Resolution>(), Ok(Resolution::new(800, 600)));
        assert_eq!("64X32".parse::<Resolution>(), Ok(Resolution::new(64, 32)));
        assert!("800".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn should_display_as_parsable_string() {
        let resolution = Resolution::new(1920, 1080);
        assert_eq!(resolution.to_string().parse::<Resolution>(), Ok(resolution));
        assert!((resolution.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
