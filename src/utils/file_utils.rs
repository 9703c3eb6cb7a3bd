use crate::error::Result;
use image::DynamicImage;
use itertools::Itertools;
use memmap2::Mmap;
use ndarray::Array2;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions treated as photos when enumerating a directory.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "bmp"];

/// Read a binary file using memory mapping
/// Large photos are decoded straight from the mapping without an extra copy
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: The file is not modified while the mmap is active
    unsafe { Mmap::map(&file) }.map_err(io::Error::other)
}

/// Photo files in `dir`, sorted by file name.
pub fn list_photos(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_photo_extension(&path) {
            paths.push(path);
        }
    }
    Ok(paths
        .into_iter()
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect())
}

fn has_photo_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PHOTO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an encoded photo into 8-bit luma widened to `f64`, indexed `[row, col]`.
///
/// Colour photos are reduced with the ITU-R 601-2 weights
/// (`0.299 R + 0.587 G + 0.114 B`, rounded).
pub fn decode_grayscale(bytes: &[u8]) -> Result<Array2<f64>> {
    let image = image::load_from_memory(bytes)?;
    Ok(to_luma_array(&image))
}

/// Memory-map and decode one photo.
pub fn load_grayscale(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let mmap = read_binary_file_mmap(path)?;
    decode_grayscale(&mmap)
}

pub fn to_luma_array(image: &DynamicImage) -> Array2<f64> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    match image {
        DynamicImage::ImageLuma8(gray) => {
            Array2::from_shape_fn((height, width), |(r, c)| {
                gray.get_pixel(c as u32, r as u32).0[0] as f64
            })
        }
        other => {
            let rgb = other.to_rgb8();
            Array2::from_shape_fn((height, width), |(r, c)| {
                let [red, green, blue] = rgb.get_pixel(c as u32, r as u32).0;
                luma_601(red, green, blue) as f64
            })
        }
    }
}

/// Fixed-point ITU-R 601-2 luma, rounded to nearest.
pub fn luma_601(red: u8, green: u8, blue: u8) -> u8 {
    ((red as u32 * 19595 + green as u32 * 38470 + blue as u32 * 7471 + 0x8000) >> 16) as u8
}
