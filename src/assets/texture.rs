//! Image loading for 2D textures and cube maps
//!
//! Every texture is stored as tightly packed RGBA8, top row first.

use std::path::{Path, PathBuf};

use image::{imageops, imageops::FilterType, RgbaImage};

use super::AssetError;

/// Largest width or height the device is asked to support
pub const MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Face order of a cube map, matching wgpu array layers 0..6
pub const CUBE_FACE_SUFFIXES: [&str; 6] = ["posx", "negx", "posy", "negy", "posz", "negz"];

/// Channel layout requested for an empty texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    Rgb8,
    #[default]
    Rgba8,
}

/// Size and format of a texture created in code rather than loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture2DDescription {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl Default for Texture2DDescription {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
        }
    }
}

impl Texture2DDescription {
    /// Allocates a black texture; RGB textures get an opaque alpha channel
    pub fn create(&self) -> TextureData {
        let alpha = match self.format {
            TextureFormat::Rgb8 => 255,
            TextureFormat::Rgba8 => 0,
        };
        TextureData::solid_color(self.width, self.height, [0, 0, 0, alpha])
    }
}

/// Decoded pixels ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// RGBA8, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: color.repeat(pixel_count),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::not_found(path));
        }
        let image = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = fit_to_device(image.to_rgba8(), path);
        let (width, height) = rgba.dimensions();
        log::info!("Loaded image {}x{} from {:?}", width, height, path);
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Fills every pixel with opaque white
    pub fn clear(&mut self) {
        self.clear_to([255, 255, 255, 255]);
    }

    pub fn clear_to(&mut self, color: [u8; 4]) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = ((y * self.width + x) * 4) as usize;
        self.pixels
            .get(start..start + 4)
            .and_then(|p| p.try_into().ok())
    }
}

/// Six square faces of equal size in [`CUBE_FACE_SUFFIXES`] order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeMapData {
    pub faces: [TextureData; 6],
}

impl CubeMapData {
    pub fn solid_color(size: u32, color: [u8; 4]) -> Self {
        Self {
            faces: std::array::from_fn(|_| TextureData::solid_color(size, size, color)),
        }
    }

    pub fn face_size(&self) -> u32 {
        self.faces[0].width
    }
}

/// Size after scaling the longest side down to [`MAX_TEXTURE_DIMENSION`], keeping aspect
pub fn fitted_size(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_TEXTURE_DIMENSION {
        return (width, height);
    }
    let scale = MAX_TEXTURE_DIMENSION as f64 / longest as f64;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, MAX_TEXTURE_DIMENSION);
    (fit(width), fit(height))
}

fn fit_to_device(rgba: RgbaImage, path: &Path) -> RgbaImage {
    let (width, height) = rgba.dimensions();
    let (fit_width, fit_height) = fitted_size(width, height);
    if (fit_width, fit_height) == (width, height) {
        return rgba;
    }
    log::warn!(
        "Image {:?} is {}x{}, downscaling to {}x{}",
        path,
        width,
        height,
        fit_width,
        fit_height
    );
    imageops::resize(&rgba, fit_width, fit_height, FilterType::Triangle)
}

pub fn load_texture_2d(path: &Path) -> Result<TextureData, AssetError> {
    TextureData::from_file(path)
}

/// Face file names for a cube map given as `dir/name.ext`
///
/// `images/sky/ocean.jpg` expands to `images/sky/ocean_posx.jpg`,
/// `images/sky/ocean_negx.jpg` and so on.
pub fn cube_face_paths(path: &Path) -> Result<[PathBuf; 6], AssetError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AssetError::InvalidPath(path.to_path_buf()))?;
    let extension = path.extension().and_then(|e| e.to_str());
    Ok(CUBE_FACE_SUFFIXES.map(|suffix| {
        let name = match extension {
            Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
            None => format!("{}_{}", stem, suffix),
        };
        path.with_file_name(name)
    }))
}

pub fn load_cube_map(path: &Path) -> Result<CubeMapData, AssetError> {
    let face_paths = cube_face_paths(path)?;
    for (face_path, suffix) in face_paths.iter().zip(CUBE_FACE_SUFFIXES) {
        if !face_path.exists() {
            return Err(AssetError::MissingCubeFace {
                path: path.to_path_buf(),
                face: suffix,
            });
        }
    }

    let mut faces = Vec::with_capacity(6);
    for face_path in &face_paths {
        faces.push(TextureData::from_file(face_path)?);
    }
    let size = faces[0].width;
    if faces.iter().any(|f| f.width != size || f.height != size) {
        return Err(AssetError::CubeFaceSize {
            path: path.to_path_buf(),
        });
    }
    let faces: [TextureData; 6] = faces
        .try_into()
        .map_err(|_| AssetError::InvalidPath(path.to_path_buf()))?;
    log::info!("Loaded cube map {:?} ({}px faces)", path, size);
    Ok(CubeMapData { faces })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
        ImageBuffer::from_pixel(width, height, Rgba(color))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_empty_texture_clears_to_white() {
        let desc = Texture2DDescription {
            width: 1,
            height: 1,
            format: TextureFormat::Rgb8,
        };
        let mut texture = desc.create();
        assert_eq!(texture.pixel(0, 0), Some([0, 0, 0, 255]));
        texture.clear();
        assert_eq!(texture.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(texture.pixel(1, 0), None);
    }

    #[test]
    fn test_cube_face_paths_keep_extension() {
        let paths = cube_face_paths(Path::new("images/cubemaps/skybox/ocean.jpg")).unwrap();
        assert_eq!(
            paths[0],
            PathBuf::from("images/cubemaps/skybox/ocean_posx.jpg")
        );
        assert_eq!(
            paths[5],
            PathBuf::from("images/cubemaps/skybox/ocean_negz.jpg")
        );
    }

    #[test]
    fn test_load_texture_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grass.png");
        write_png(&path, 2, 3, [10, 200, 30, 255]);

        let texture = load_texture_2d(&path).unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(texture.pixel(1, 2), Some([10, 200, 30, 255]));
    }

    #[test]
    fn test_fitted_size_keeps_aspect() {
        assert_eq!(fitted_size(1024, 512), (1024, 512));
        assert_eq!(fitted_size(8192, 4096), (4096, 2048));
        assert_eq!(fitted_size(2, 10000), (1, 4096));
    }

    #[test]
    fn test_oversized_texture_is_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, MAX_TEXTURE_DIMENSION + 4, 2, [90, 60, 30, 255]);

        let texture = load_texture_2d(&path).unwrap();
        assert_eq!((texture.width, texture.height), (MAX_TEXTURE_DIMENSION, 2));
        assert_eq!(texture.pixels.len(), (MAX_TEXTURE_DIMENSION * 2 * 4) as usize);
        assert_eq!(texture.pixel(100, 1), Some([90, 60, 30, 255]));
    }

    #[test]
    fn test_missing_texture_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_texture_2d(&dir.path().join("nope.png")).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_cube_map_loads_six_faces() {
        let dir = tempfile::tempdir().unwrap();
        for (i, suffix) in CUBE_FACE_SUFFIXES.iter().enumerate() {
            let path = dir.path().join(format!("ocean_{}.png", suffix));
            write_png(&path, 4, 4, [i as u8, 0, 0, 255]);
        }
        let cube = load_cube_map(&dir.path().join("ocean.png")).unwrap();
        assert_eq!(cube.face_size(), 4);
        assert_eq!(cube.faces[3].pixel(0, 0), Some([3, 0, 0, 255]));
    }

    #[test]
    fn test_cube_map_reports_missing_face() {
        let dir = tempfile::tempdir().unwrap();
        for suffix in &CUBE_FACE_SUFFIXES[..5] {
            write_png(&dir.path().join(format!("ocean_{}.png", suffix)), 4, 4, [0; 4]);
        }
        match load_cube_map(&dir.path().join("ocean.png")) {
            Err(AssetError::MissingCubeFace { face, .. }) => assert_eq!(face, "negz"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cube_map_rejects_mismatched_faces() {
        let dir = tempfile::tempdir().unwrap();
        for (i, suffix) in CUBE_FACE_SUFFIXES.iter().enumerate() {
            let size = if i == 2 { 8 } else { 4 };
            write_png(&dir.path().join(format!("sky_{}.png", suffix)), size, size, [0; 4]);
        }
        assert!(matches!(
            load_cube_map(&dir.path().join("sky.png")),
            Err(AssetError::CubeFaceSize { .. })
        ));
    }
}
