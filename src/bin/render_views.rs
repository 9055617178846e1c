//! Command line entry point: `render-views <asset.glb> [-o DIR] [-n VIEWS] [-r WxH]`.

use anyhow::Context as _;
use clap::Parser;
use nerf_capture::{OffscreenRenderer, capture_views, config::Args, resources::load_geometry_gltf};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.capture_config();
    config.validate()?;

    let loader = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let source = loader
        .block_on(load_geometry_gltf(&args.asset))
        .with_context(|| format!("could not load {}", args.asset.display()))?;
    drop(loader);
    if source.is_fallback() {
        log::warn!("{} was loaded through a fallback path", args.asset.display());
    }

    let mut renderer = OffscreenRenderer::new()?;
    let report = capture_views(&mut renderer, source.geometry(), &config)?;

    log::info!(
        "done: {} images, camera distance {:.4}, manifest at {}",
        report.images.len(),
        report.camera_distance,
        report.manifest_path.display()
    );
    Ok(())
}
