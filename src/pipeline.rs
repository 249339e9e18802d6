//! The full merge: exposures in, `.hdr` and tone-mapped PNGs out.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use hdr::RadianceImage;
use sensor_analysis::{ResponseConfig, ResponseCurve, ResponseMethod};
use tone_map::{ExternalToneMapper, ToneMapError, ToneMapMethod};
use tracing::{info, warn};

use crate::{
    exposure::ExposureSet,
    merge::{assemble, fuse_channel},
    progress::Progress,
    Error, Result,
};

/// Directory (inside the exposure folder) that tone-mapped images go in.
pub const RESULTS_DIR: &str = "Results";

const CHANNEL_NAMES: [&str; 3] = ["red", "green", "blue"];

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub method: ResponseMethod,
    pub config: ResponseConfig,

    /// Tone mapping methods to run, in order.
    pub tone_maps: Vec<ToneMapMethod>,
}

impl Default for PipelineOptions {
    fn default() -> PipelineOptions {
        PipelineOptions {
            method: ResponseMethod::Debevec,
            config: ResponseConfig::default(),
            tone_maps: ToneMapMethod::DEFAULT_SEQUENCE.to_vec(),
        }
    }
}

/// Parses a `<width>x<height>` sample grid, e.g. "25x25".
pub fn parse_sample_grid(text: &str) -> Option<(usize, usize)> {
    let (w, h) = text.trim().split_once(|c| c == 'x' || c == 'X')?;
    let w: usize = w.trim().parse().ok()?;
    let h: usize = h.trim().parse().ok()?;
    if w == 0 || h == 0 {
        None
    } else {
        Some((w, h))
    }
}

/// Estimates one response curve per color channel, in R,G,B order.
pub fn estimate_curves(
    set: &ExposureSet,
    method: ResponseMethod,
    config: &ResponseConfig,
) -> Result<[ResponseCurve; 3]> {
    let estimate = |chan: usize| {
        info!(method = method.name(), "Estimating {} response", CHANNEL_NAMES[chan]);
        method.estimate(&set.channel(chan), config)
    };
    Ok([estimate(0)?, estimate(1)?, estimate(2)?])
}

/// Fuses every channel with its curve and assembles the radiance image.
pub fn build_radiance(
    set: &ExposureSet,
    curves: &[ResponseCurve; 3],
    config: &ResponseConfig,
    progress: &mut dyn Progress,
) -> Result<RadianceImage> {
    let ln_t = set.log_exposures();
    let mut ln_radiance = Vec::with_capacity(3);
    for (chan, curve) in curves.iter().enumerate() {
        info!("Fusing {} channel", CHANNEL_NAMES[chan]);
        ln_radiance.push(fuse_channel(
            curve,
            &set.channel(chan),
            &ln_t,
            &config.weights,
            progress,
        )?);
    }

    let (width, height) = set.dimensions();
    assemble(
        &ln_radiance[0],
        &ln_radiance[1],
        &ln_radiance[2],
        width,
        height,
    )
}

/// Suffix used in output file names: the method's first letter.
fn method_suffix(method: ResponseMethod) -> &'static str {
    &method.name()[..1]
}

/// `<folder>/output_<m>.hdr`
pub fn hdr_path(folder: &Path, method: ResponseMethod) -> PathBuf {
    folder.join(format!("output_{}.hdr", method_suffix(method)))
}

/// `<folder>/Results/<tone map>_ldr_<m>.png`
pub fn ldr_path(folder: &Path, tone_map: &ToneMapMethod, method: ResponseMethod) -> PathBuf {
    folder.join(RESULTS_DIR).join(format!(
        "{}_ldr_{}.png",
        tone_map.name(),
        method_suffix(method)
    ))
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub hdr_path: PathBuf,

    /// Tone-mapped images that were written.
    pub written: Vec<PathBuf>,

    /// Tone mapping methods that were skipped as unavailable.
    pub skipped: Vec<&'static str>,
}

/// Runs the whole merge on an exposure folder.
///
/// Tone mapping methods that are unavailable (external operators with no
/// `external` mapper, or a mapper that fails) are skipped with a warning.
/// Everything else that goes wrong aborts the run.
pub fn run(
    folder: &Path,
    options: &PipelineOptions,
    external: Option<&dyn ExternalToneMapper>,
    progress: &mut dyn Progress,
) -> Result<RunReport> {
    let set = ExposureSet::load_folder(folder)?;
    let (width, height) = set.dimensions();
    info!(
        images = set.len(),
        width,
        height,
        "Loaded exposures {:?}",
        set.exposures()
    );

    let curves = estimate_curves(&set, options.method, &options.config)?;
    let radiance = build_radiance(&set, &curves, &options.config, progress)?;

    let hdr_path = hdr_path(folder, options.method);
    info!(path = %hdr_path.display(), "Writing HDR image");
    let mut out = BufWriter::new(File::create(&hdr_path)?);
    radiance.write_hdr(&mut out)?;
    out.flush()?;

    let mut report = RunReport {
        hdr_path: hdr_path,
        written: Vec::new(),
        skipped: Vec::new(),
    };
    if options.tone_maps.is_empty() {
        return Ok(report);
    }

    std::fs::create_dir_all(folder.join(RESULTS_DIR))?;
    for tone_map in options.tone_maps.iter() {
        info!(method = tone_map.name(), "Tone mapping");
        let image = match tone_map.map(&radiance, external) {
            Ok(image) => image,
            Err(e @ ToneMapError::Unavailable(_)) | Err(e @ ToneMapError::External(_)) => {
                warn!(method = tone_map.name(), "Skipping tone mapping: {}", e);
                report.skipped.push(tone_map.name());
                continue;
            }
            Err(e) => return Err(Error::ToneMap(e)),
        };

        let path = ldr_path(folder, tone_map, options.method);
        let file = BufWriter::new(File::create(&path)?);
        image_fmt::png_fmt::save(file, image.width, image.height, &image.pixels)?;
        report.written.push(path);
    }

    Ok(report)
}
