use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use filtermix_core::FilterMixer;
use filtermix_core::source::{has_supported_extension, save_image};
use filtermix_metadata::load_upright;
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::commands::build_mixer;
use crate::settings::Settings;

pub fn run(args: &RenderArgs, settings: &Settings) -> Result<()> {
    let mut mixer = build_mixer(settings, &args.stack)?;
    info!(filters = ?mixer.filters(), "render stack ready");

    if args.input.is_dir() {
        return render_directory(&mut mixer, args);
    }

    let image = load_upright(&args.input, args.max_edge)?;
    mixer.set_original_image(image);
    let filtered = mixer
        .filtered_image()
        .context("pipeline produced no image")?;
    save_image(filtered, &args.output)
}

/// Push every supported image in the input directory through the mixer in
/// live mode. Files that fail are logged and skipped.
fn render_directory(mixer: &mut FilterMixer, args: &RenderArgs) -> Result<()> {
    fs::create_dir_all(&args.output)
        .with_context(|| format!("create output dir: {}", args.output.display()))?;
    mixer.set_live_mode(true);

    let mut inputs: Vec<PathBuf> = fs::read_dir(&args.input)
        .with_context(|| format!("failed to read directory: {}", args.input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_supported_extension(path))
        .collect();
    inputs.sort();

    let mut rendered = 0;
    let mut failed = 0;
    for path in &inputs {
        match render_frame(mixer, path, &args.output, args.max_edge) {
            Ok(()) => rendered += 1,
            Err(err) => {
                warn!(?path, %err, "failed to render");
                failed += 1;
            }
        }
    }

    info!(rendered, failed, "render complete");
    if rendered == 0 && failed > 0 {
        bail!("no images could be rendered");
    }
    Ok(())
}

fn render_frame(
    mixer: &mut FilterMixer,
    path: &Path,
    output_dir: &Path,
    max_edge: Option<u32>,
) -> Result<()> {
    let frame = load_upright(path, max_edge)?;
    let filtered = mixer.process_frame(frame)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("input has no file name")?;
    save_image(&filtered, &output_dir.join(format!("{stem}.png")))
}
