//! Loading of bracketed exposure sets.
//!
//! A set lives in a folder alongside an `image_list.txt` manifest, with
//! one `<filename> <exposure seconds>` pair per line.

use std::path::{Path, PathBuf};

use sensor_analysis::ExposureSample;
use tracing::{debug, info};

use crate::{load_image, Error, Result, SourceImage};

pub const MANIFEST_NAME: &str = "image_list.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub filename: String,

    /// Exposure time in seconds.
    pub exposure: f64,

    /// 1-based line number in the manifest.
    pub line: usize,
}

/// Parses manifest text.  `path` is only used in error messages.
///
/// Blank lines are skipped.  Every other line must be exactly a file name
/// and a positive, finite exposure time.
pub fn parse_manifest(text: &str, path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        let fail = |reason: String| Error::Manifest {
            path: path.to_path_buf(),
            line: line_number,
            reason: reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (filename, exposure) = match fields[..] {
            [] => continue,
            [filename, exposure] => (filename, exposure),
            _ => {
                return Err(fail(format!(
                    "expected '<filename> <seconds>', found {} fields",
                    fields.len()
                )))
            }
        };

        let exposure = exposure
            .parse::<f64>()
            .map_err(|_| fail(format!("'{}' is not a number", exposure)))?;
        if !(exposure > 0.0 && exposure.is_finite()) {
            return Err(fail(format!(
                "exposure time must be positive, found {}",
                exposure
            )));
        }

        entries.push(ManifestEntry {
            filename: filename.to_string(),
            exposure: exposure,
            line: line_number,
        });
    }

    Ok(entries)
}

/// Reads `<folder>/image_list.txt`.
pub fn read_manifest(folder: &Path) -> Result<Vec<ManifestEntry>> {
    let path = folder.join(MANIFEST_NAME);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MissingManifest(path))
        }
        Err(e) => return Err(e.into()),
    };
    parse_manifest(&text, &path)
}

/// Images of one scene at distinct exposure times, sorted by ascending
/// exposure, all with the same dimensions.
#[derive(Debug, Clone)]
pub struct ExposureSet {
    images: Vec<SourceImage>,
}

impl ExposureSet {
    /// Validates and sorts `images`.
    pub fn new(mut images: Vec<SourceImage>) -> Result<ExposureSet> {
        let first = images.first().ok_or(Error::NoImages)?;
        let expected = first.dimensions();

        for img in images.iter() {
            if img.dimensions() != expected || img.pixels.len() != expected.0 * expected.1 {
                return Err(Error::DimensionMismatch {
                    name: img.info.filename.clone(),
                    expected: expected,
                    found: img.dimensions(),
                });
            }
            let exposure = img.info.exposure;
            if !(exposure > 0.0 && exposure.is_finite()) {
                return Err(Error::InvalidExposure {
                    name: img.info.filename.clone(),
                    exposure: exposure,
                });
            }
        }

        images.sort_by(|a, b| a.info.exposure.total_cmp(&b.info.exposure));
        for pair in images.windows(2) {
            if pair[0].info.exposure == pair[1].info.exposure {
                return Err(Error::DuplicateExposure(pair[0].info.exposure));
            }
        }

        Ok(ExposureSet { images: images })
    }

    /// Loads every image listed in the folder's manifest.
    pub fn load_folder(folder: &Path) -> Result<ExposureSet> {
        let entries = read_manifest(folder)?;
        info!(
            folder = %folder.display(),
            count = entries.len(),
            "Loading exposures"
        );

        let mut images = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            let path: PathBuf = folder.join(&entry.filename);
            debug!(path = %path.display(), exposure = entry.exposure, "Loading image");
            images.push(load_image(&path, entry.exposure)?);
        }

        ExposureSet::new(images)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.images[0].dimensions()
    }

    pub fn images(&self) -> &[SourceImage] {
        &self.images
    }

    /// Exposure times, ascending.
    pub fn exposures(&self) -> Vec<f64> {
        self.images.iter().map(|img| img.info.exposure).collect()
    }

    pub fn log_exposures(&self) -> Vec<f64> {
        self.images.iter().map(|img| img.info.exposure.ln()).collect()
    }

    /// One color channel of every exposure (0 = red, 1 = green,
    /// 2 = blue).
    pub fn channel(&self, chan: usize) -> Vec<ExposureSample> {
        let (width, height) = self.dimensions();
        self.images
            .iter()
            .map(|img| ExposureSample {
                width: width,
                height: height,
                pixels: img.channel(chan),
                exposure: img.info.exposure,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::write_png, ErrorKind, ImageInfo};

    fn image(name: &str, width: usize, height: usize, exposure: f64) -> SourceImage {
        SourceImage {
            pixels: vec![[10, 20, 30]; width * height],
            info: ImageInfo {
                filename: name.into(),
                full_filepath: name.into(),
                width: width,
                height: height,
                exposure: exposure,
                bit_depth: 8,
            },
        }
    }

    fn manifest_error_line(text: &str) -> usize {
        match parse_manifest(text, Path::new("image_list.txt")) {
            Err(Error::Manifest { line, .. }) => line,
            other => panic!("expected manifest error, got {:?}", other),
        }
    }

    #[test]
    fn parse_valid_manifest() {
        let text = "a.png 0.5\n\n  b.png\t2\nc.jpg 1e-3\n";
        let entries = parse_manifest(text, Path::new("image_list.txt")).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    filename: "a.png".into(),
                    exposure: 0.5,
                    line: 1,
                },
                ManifestEntry {
                    filename: "b.png".into(),
                    exposure: 2.0,
                    line: 3,
                },
                ManifestEntry {
                    filename: "c.jpg".into(),
                    exposure: 0.001,
                    line: 4,
                },
            ]
        );
    }

    #[test]
    fn malformed_lines_name_their_line() {
        assert_eq!(manifest_error_line("a.png 1\nb.png\n"), 2);
        assert_eq!(manifest_error_line("a.png 1 extra\n"), 1);
        assert_eq!(manifest_error_line("a.png 1\n\nb.png fast\n"), 3);
        assert_eq!(manifest_error_line("a.png 0\n"), 1);
        assert_eq!(manifest_error_line("a.png 1\nb.png -2\n"), 2);
        assert_eq!(manifest_error_line("a.png inf\n"), 1);
    }

    #[test]
    fn missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingManifest(_)));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn set_is_sorted() {
        let set = ExposureSet::new(vec![
            image("b", 2, 2, 4.0),
            image("a", 2, 2, 0.25),
            image("c", 2, 2, 1.0),
        ])
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.exposures(), vec![0.25, 1.0, 4.0]);
        assert_eq!(set.images()[0].info.filename, "a");
        assert!((set.log_exposures()[2] - 4.0f64.ln()).abs() < 1e-12);

        let green = set.channel(1);
        assert_eq!(green.len(), 3);
        assert_eq!(green[0].pixels, vec![20; 4]);
        assert_eq!(green[2].exposure, 4.0);
        assert_eq!(green[1].dimensions(), (2, 2));
    }

    #[test]
    fn set_rejects_bad_input() {
        assert!(matches!(ExposureSet::new(vec![]), Err(Error::NoImages)));
        assert!(matches!(
            ExposureSet::new(vec![image("a", 2, 2, 1.0), image("b", 3, 2, 2.0)]),
            Err(Error::DimensionMismatch { found: (3, 2), .. })
        ));
        assert!(matches!(
            ExposureSet::new(vec![image("a", 2, 2, 1.0), image("b", 2, 2, 0.0)]),
            Err(Error::InvalidExposure { .. })
        ));
        assert!(matches!(
            ExposureSet::new(vec![
                image("a", 2, 2, 1.0),
                image("b", 2, 2, 2.0),
                image("c", 2, 2, 1.0),
            ]),
            Err(Error::DuplicateExposure(e)) if e == 1.0
        ));
    }

    #[test]
    fn load_folder() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("dark.png"), 2, 1, &[[1, 1, 1], [2, 2, 2]]);
        write_png(&dir.path().join("bright.png"), 2, 1, &[[8, 8, 8], [16, 16, 16]]);
        std::fs::write(
            dir.path().join(MANIFEST_NAME),
            "bright.png 0.125\ndark.png 0.015625\n",
        )
        .unwrap();

        let set = ExposureSet::load_folder(dir.path()).unwrap();
        assert_eq!(set.exposures(), vec![0.015625, 0.125]);
        assert_eq!(set.images()[0].pixels, vec![[1, 1, 1], [2, 2, 2]]);
        assert_eq!(set.dimensions(), (2, 1));
    }

    #[test]
    fn load_folder_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), "ghost.png 1\n").unwrap();
        assert!(matches!(
            ExposureSet::load_folder(dir.path()),
            Err(Error::ImageLoad { .. })
        ));
    }
}
