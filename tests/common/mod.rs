#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use assetdag::config::ConfigFile;
use assetdag::fs::RealFileSystem;
use assetdag::tasks::TaskContext;

pub use assetdag_test_utils::builders;
pub use assetdag_test_utils::fake_backend::FakeBackend;
pub use assetdag_test_utils::{init_tracing, with_timeout};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// Move a file's mtime `secs` seconds into the past (negative: future).
pub fn age(root: &Path, rel: &str, secs: i64) {
    let now = SystemTime::now();
    let t = if secs >= 0 {
        now - Duration::from_secs(secs as u64)
    } else {
        now + Duration::from_secs(secs.unsigned_abs())
    };
    let file = fs::File::options().write(true).open(root.join(rel)).unwrap();
    file.set_modified(t).unwrap();
}

/// A task context over the real filesystem rooted at `root`.
pub fn context(root: &Path, config: ConfigFile) -> Arc<TaskContext> {
    Arc::new(TaskContext::new(root, config, Arc::new(RealFileSystem)))
}

/// A small uncompressed-ish PNG.
pub fn sample_png() -> Vec<u8> {
    use image::ImageEncoder;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let img = image::RgbaImage::from_fn(16, 16, |x, y| {
        image::Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
        .write_image(img.as_raw(), 16, 16, image::ColorType::Rgba8)
        .unwrap();
    out.into_inner()
}
