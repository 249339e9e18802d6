use std::path::Path;

use anyhow::{anyhow, Context};
use clap::{App, Arg};
use tracing::{info, warn};

use lib::{
    pipeline::{self, PipelineOptions},
    progress::LogProgress,
};
use sensor_analysis::{ReferenceMethod, ResponseMethod};
use tone_map::ToneMapMethod;

fn main() -> anyhow::Result<()> {
    let matches = App::new("HDRI Merge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Merges a folder of bracketed exposures into an HDR image, and tone maps it for display")
        .arg(
            Arg::with_name("FOLDER")
                .help("Folder containing the images and an image_list.txt of '<filename> <seconds>' lines")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("METHOD")
                .help("Response curve estimation method")
                .required(true)
                .possible_values(&["debevec", "robertson", "mitsunaga"])
                .case_insensitive(true)
                .index(2),
        )
        .arg(
            Arg::with_name("tonemap")
                .long("tonemap")
                .value_name("METHOD")
                .help("Tone mapping methods to run, in order [default: Reinhard,Mantiuk,global,durandanddorsy,Drago]")
                .takes_value(true)
                .multiple(true)
                .use_delimiter(true)
                .validator(|s| {
                    s.parse::<ToneMapMethod>()
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                }),
        )
        .arg(
            Arg::with_name("sample_grid")
                .long("sample-grid")
                .value_name("WxH")
                .help("Largest image size fed to the least-squares estimators [default: 25x25]")
                .takes_value(true)
                .validator(|s| {
                    pipeline::parse_sample_grid(&s)
                        .map(|_| ())
                        .ok_or_else(|| format!("expected <width>x<height>, got '{}'", s))
                }),
        )
        .arg(
            Arg::with_name("epochs")
                .long("epochs")
                .value_name("N")
                .help("Number of Robertson epochs [default: 5]")
                .takes_value(true)
                .validator(|s| {
                    s.parse::<usize>()
                        .map(|_| ())
                        .map_err(|_| format!("'{}' is not a whole number", s))
                }),
        )
        .arg(
            Arg::with_name("reference")
                .long("reference")
                .value_name("METHOD")
                .help("Curve that Mitsunaga's result is rescaled to match [default: debevec]")
                .takes_value(true)
                .possible_values(&["debevec", "robertson"])
                .case_insensitive(true),
        )
        .get_matches();

    lib::logger::init();

    let mut options = PipelineOptions::default();
    options.method = matches
        .value_of("METHOD")
        .ok_or_else(|| anyhow!("no method given"))?
        .parse::<ResponseMethod>()?;
    if let Some(values) = matches.values_of("tonemap") {
        options.tone_maps = values
            .map(|s| s.parse::<ToneMapMethod>())
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(grid) = matches.value_of("sample_grid") {
        options.config.sample_grid = pipeline::parse_sample_grid(grid)
            .ok_or_else(|| anyhow!("invalid sample grid '{}'", grid))?;
    }
    if let Some(epochs) = matches.value_of("epochs") {
        options.config.robertson.epochs = epochs.parse()?;
    }
    if let Some(reference) = matches.value_of("reference") {
        options.config.mitsunaga.reference = reference.parse::<ReferenceMethod>()?;
    }

    let folder = Path::new(
        matches
            .value_of("FOLDER")
            .ok_or_else(|| anyhow!("no folder given"))?,
    );
    let report = pipeline::run(folder, &options, None, &mut LogProgress::new())
        .with_context(|| format!("Failed to merge exposures in {}", folder.display()))?;

    info!(path = %report.hdr_path.display(), "Wrote HDR image");
    for path in report.written.iter() {
        info!(path = %path.display(), "Wrote tone-mapped image");
    }
    if !report.skipped.is_empty() {
        warn!("Skipped unavailable tone mapping methods: {}", report.skipped.join(", "));
    }

    Ok(())
}
