//! Screenshot comparison against checked-in baselines
//!
//! The diff algorithm is deliberately plain: a SHA-256 fast path for identical
//! files, then a per-pixel comparison with a small channel tolerance for
//! anti-aliasing and compression noise.

use std::path::{Path, PathBuf};

use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Per-channel difference below this is treated as identical.
const CHANNEL_TOLERANCE: i32 = 5;

#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,

    /// Allowed pixel difference in percent (0.0 - 100.0)
    pub threshold: f64,

    /// Adopt the actual screenshot as baseline when none exists
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("check-results/baselines"),
            actual_dir: PathBuf::from("check-results/screenshots"),
            diff_dir: PathBuf::from("check-results/diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }
}

/// Result of one comparison
#[derive(Debug, Clone)]
pub struct SnapshotDiff {
    pub matches: bool,
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,

    /// Written only when pixels differ
    pub diff_image: Option<PathBuf>,
}

pub struct VisualTester {
    config: VisualConfig,
}

impl VisualTester {
    pub fn new(config: VisualConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    /// Compare the named screenshot against its baseline.
    pub fn compare(&self, name: &str, threshold: Option<f64>) -> HarnessResult<SnapshotDiff> {
        let threshold = threshold.unwrap_or(self.config.threshold);
        let actual_path = self.actual_path(name);
        let baseline_path = self.baseline_path(name);

        if !actual_path.exists() {
            return Err(HarnessError::VisualRegression(format!(
                "actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        if !baseline_path.exists() {
            if self.config.auto_update {
                info!("adopting '{}' as baseline", name);
                std::fs::copy(&actual_path, &baseline_path)?;
                return Ok(SnapshotDiff {
                    matches: true,
                    diff_percent: 0.0,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_image: None,
                });
            }
            return Err(HarnessError::BaselineNotFound(
                baseline_path.display().to_string(),
            ));
        }

        // Byte-identical files need no pixel work.
        if file_sha256(&actual_path)? == file_sha256(&baseline_path)? {
            let actual = image::open(&actual_path)?;
            let (w, h) = actual.dimensions();
            return Ok(SnapshotDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: w as u64 * h as u64,
                diff_image: None,
            });
        }

        let actual = image::open(&actual_path)?.to_rgba8();
        let baseline = image::open(&baseline_path)?.to_rgba8();

        if actual.dimensions() != baseline.dimensions() {
            warn!(
                "'{}' dimensions changed: baseline {:?}, actual {:?}",
                name,
                baseline.dimensions(),
                actual.dimensions()
            );
            let (w, h) = actual.dimensions();
            return Ok(SnapshotDiff {
                matches: false,
                diff_percent: 100.0,
                diff_pixels: w as u64 * h as u64,
                total_pixels: w as u64 * h as u64,
                diff_image: None,
            });
        }

        let (width, height) = actual.dimensions();
        let total_pixels = width as u64 * height as u64;
        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;

        for y in 0..height {
            for x in 0..width {
                let a = actual.get_pixel(x, y);
                let b = baseline.get_pixel(x, y);
                if pixels_close(a, b) {
                    // Dimmed copy keeps the context visible around the diff.
                    let c = a.channels();
                    diff_img.put_pixel(x, y, image::Rgba([c[0] / 2, c[1] / 2, c[2] / 2, 128]));
                } else {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                }
            }
        }

        let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;
        let matches = diff_percent <= threshold;

        let diff_image = if diff_pixels > 0 {
            let path = self.config.diff_dir.join(format!("{}-diff.png", name));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "'{}' differs by {:.2}% ({} of {} pixels, threshold {:.2}%)",
                name, diff_percent, diff_pixels, total_pixels, threshold
            );
        }

        Ok(SnapshotDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image,
        })
    }

    /// Promote the actual screenshot to baseline.
    pub fn update_baseline(&self, name: &str) -> HarnessResult<()> {
        let actual_path = self.actual_path(name);
        if !actual_path.exists() {
            return Err(HarnessError::VisualRegression(format!(
                "cannot update baseline, actual screenshot not found: {}",
                actual_path.display()
            )));
        }
        std::fs::copy(&actual_path, self.baseline_path(name))?;
        info!("updated baseline for '{}'", name);
        Ok(())
    }

    /// Promote every screenshot in the actual directory.
    pub fn update_all_baselines(&self) -> HarnessResult<Vec<String>> {
        let mut updated = Vec::new();
        for entry in std::fs::read_dir(&self.config.actual_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    let name = name.to_string_lossy().to_string();
                    self.update_baseline(&name)?;
                    updated.push(name);
                }
            }
        }
        updated.sort();
        Ok(updated)
    }

    fn actual_path(&self, name: &str) -> PathBuf {
        self.config.actual_dir.join(format!("{}.png", name))
    }

    fn baseline_path(&self, name: &str) -> PathBuf {
        self.config.baseline_dir.join(format!("{}.png", name))
    }
}

fn pixels_close(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    a.channels()
        .iter()
        .zip(b.channels())
        .all(|(&x, &y)| (x as i32 - y as i32).abs() <= CHANNEL_TOLERANCE)
}

fn file_sha256(path: &Path) -> HarnessResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester(dir: &Path, auto_update: bool) -> VisualTester {
        VisualTester::new(VisualConfig {
            baseline_dir: dir.join("baselines"),
            actual_dir: dir.join("actual"),
            diff_dir: dir.join("diffs"),
            threshold: 0.5,
            auto_update,
        })
        .unwrap()
    }

    fn solid_image(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba(color))
    }

    #[test]
    fn identical_screenshots_match() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        let img = solid_image(10, 10, [10, 20, 30, 255]);
        img.save(dir.path().join("actual/home.png")).unwrap();
        img.save(dir.path().join("baselines/home.png")).unwrap();

        let diff = t.compare("home", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
        assert!(diff.diff_image.is_none());
    }

    #[test]
    fn changed_pixels_above_threshold_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        solid_image(10, 10, [0, 0, 0, 255])
            .save(dir.path().join("baselines/home.png"))
            .unwrap();
        let mut actual = solid_image(10, 10, [0, 0, 0, 255]);
        // 2 of 100 pixels flip, past the 0.5% threshold
        actual.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        actual.put_pixel(5, 5, image::Rgba([255, 255, 255, 255]));
        actual.save(dir.path().join("actual/home.png")).unwrap();

        let diff = t.compare("home", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_pixels, 2);
        assert!((diff.diff_percent - 2.0).abs() < 1e-9);
        assert!(diff.diff_image.unwrap().exists());
    }

    #[test]
    fn small_channel_noise_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);

        solid_image(10, 10, [100, 100, 100, 255])
            .save(dir.path().join("baselines/home.png"))
            .unwrap();
        solid_image(10, 10, [103, 98, 100, 255])
            .save(dir.path().join("actual/home.png"))
            .unwrap();

        let diff = t.compare("home", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
    }

    #[test]
    fn missing_baseline_errors_unless_auto_update() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);
        solid_image(4, 4, [1, 2, 3, 255])
            .save(dir.path().join("actual/home.png"))
            .unwrap();

        match t.compare("home", None) {
            Err(HarnessError::BaselineNotFound(_)) => {}
            other => panic!("expected BaselineNotFound, got {:?}", other.map(|_| ())),
        }

        let t = tester(dir.path(), true);
        let diff = t.compare("home", None).unwrap();
        assert!(diff.matches);
        assert!(dir.path().join("baselines/home.png").exists());
    }

    #[test]
    fn dimension_change_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);
        solid_image(10, 10, [0, 0, 0, 255])
            .save(dir.path().join("baselines/home.png"))
            .unwrap();
        solid_image(12, 10, [0, 0, 0, 255])
            .save(dir.path().join("actual/home.png"))
            .unwrap();

        let diff = t.compare("home", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_percent, 100.0);
    }

    #[test]
    fn update_all_baselines_promotes_every_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let t = tester(dir.path(), false);
        solid_image(4, 4, [1, 2, 3, 255])
            .save(dir.path().join("actual/a.png"))
            .unwrap();
        solid_image(4, 4, [4, 5, 6, 255])
            .save(dir.path().join("actual/b.png"))
            .unwrap();

        let updated = t.update_all_baselines().unwrap();
        assert_eq!(updated, vec!["a", "b"]);
        assert!(dir.path().join("baselines/a.png").exists());
        assert!(dir.path().join("baselines/b.png").exists());
    }
}
