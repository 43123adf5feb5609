//! Command-line driver for `blacklight-core`.
//!
//! Contract: a single positional path to a TOML run configuration. Exits 0
//! on success after writing the selected output images; exits 1 with one
//! diagnostic line on `stderr` on any fatal error (bad config, I/O failure).
//! Per-ray failures never reach this layer -- they are already handled
//! inside the renderer.

use std::path::PathBuf;

use clap::Parser;

use blacklight_core::config::Config;
use blacklight_core::render::Renderer;

/// Render an image of a Kerr black hole's accretion flow from a run
/// configuration file.
#[derive(Parser, Debug)]
#[command(name = "blacklight")]
#[command(about = "Render a relativistic accretion-flow image from a TOML config", long_about = None)]
struct Args {
    /// Path to the TOML run configuration.
    config: PathBuf,

    /// Output image path (PNG). Defaults to the config file's stem with a
    /// .png extension in the current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("blacklight: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&args.config)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;

    tracing::info!(path = %args.config.display(), "configuration loaded");

    let renderer = Renderer::from_config(&config)?;
    let output = renderer.render();

    tracing::info!(
        levels = output.levels_run,
        pixels = output.intensity.len(),
        "render complete"
    );

    let out_stem = args.output.unwrap_or_else(|| args.config.with_extension("png"));
    if config.image_selection.light || config.image_selection.render {
        write_png(&out_stem, output.width, output.height, &output.intensity)?;
        tracing::info!(path = %out_stem.display(), "wrote output image");
    }
    for (channel, values) in &output.channels {
        let path = out_stem.with_file_name(format!(
            "{}.{channel}.png",
            out_stem.file_stem().and_then(|s| s.to_str()).unwrap_or("render"),
        ));
        write_png(&path, output.width, output.height, values)?;
        tracing::info!(path = %path.display(), channel, "wrote auxiliary image");
    }

    Ok(())
}

fn write_png(path: &std::path::Path, width: u32, height: u32, values: &[f64]) -> anyhow::Result<()> {
    let max = values.iter().cloned().filter(|v| v.is_finite()).fold(0.0_f64, f64::max).max(1e-300);

    let mut buffer = image::GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let v = values[idx];
            let normalized = if v.is_finite() { (v / max).clamp(0.0, 1.0) } else { 0.0 };
            buffer.put_pixel(x, y, image::Luma([(normalized * 255.0) as u8]));
        }
    }
    buffer.save(path)?;
    Ok(())
}
