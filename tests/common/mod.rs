use std::path::Path;

use image::{GrayImage, Luma};

/// Writes `per_class` synthetic mel PNGs for each class under `root/<class>/`.
///
/// Class `k` gets a horizontal band at a different height so the classes
/// are separable.
pub fn write_mel_dataset(root: &Path, classes: &[&str], per_class: usize, size: u32) {
    for (k, class) in classes.iter().enumerate() {
        let dir = root.join(class);
        std::fs::create_dir_all(&dir).unwrap();
        let band = (k as u32 * size / classes.len() as u32, (k as u32 + 1) * size / classes.len() as u32);
        for i in 0..per_class {
            let img = GrayImage::from_fn(size, size, |x, y| {
                let noise = ((x * 7 + y * 13 + i as u32 * 31) % 17) as u8;
                if y >= band.0 && y < band.1 { Luma([220 + noise]) } else { Luma([noise]) }
            });
            img.save(dir.join(format!("clip_{:03}.png", i))).unwrap();
        }
    }
}
