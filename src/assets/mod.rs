//! # Asset Loading
//!
//! Meshes come from Wavefront OBJ files and textures from PNG or JPEG images.
//! [`AssetLoader`] resolves paths against the configured asset root and, when
//! `allow_missing` is set, swaps missing files for placeholders so the demo
//! still starts without its art.

pub mod obj;
pub mod texture;

use std::path::{Path, PathBuf};

use cgmath::Vector3;
use thiserror::Error;

use crate::config::AssetsConfig;
use crate::gfx::geometry::{add_cube, Mesh, MeshBuilder};

pub use obj::{load_obj, parse_obj};
pub use texture::{
    cube_face_paths, fitted_size, load_cube_map, load_texture_2d, CubeMapData,
    Texture2DDescription, TextureData, TextureFormat, CUBE_FACE_SUFFIXES, MAX_TEXTURE_DIMENSION,
};

/// Colour of the placeholder cube map faces
const PLACEHOLDER_SKY: [u8; 4] = [20, 43, 79, 255];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to parse OBJ {path:?}: {source}")]
    Obj {
        path: PathBuf,
        source: tobj::LoadError,
    },
    #[error("OBJ {0:?} contains no triangles")]
    EmptyMesh(PathBuf),
    #[error("cube map {path:?} is missing its '{face}' face")]
    MissingCubeFace { path: PathBuf, face: &'static str },
    #[error("cube map {path:?} faces must be square and the same size")]
    CubeFaceSize { path: PathBuf },
    #[error("invalid asset path {0:?}")]
    InvalidPath(PathBuf),
}

impl AssetError {
    pub(crate) fn not_found(path: &Path) -> Self {
        AssetError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }

    /// True when the file simply does not exist, as opposed to being corrupt
    pub fn is_missing(&self) -> bool {
        match self {
            AssetError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            AssetError::MissingCubeFace { .. } => true,
            _ => false,
        }
    }
}

/// Resolves and loads assets relative to a root directory
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    allow_missing: bool,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>, allow_missing: bool) -> Self {
        Self {
            root: root.into(),
            allow_missing,
        }
    }

    pub fn from_config(config: &AssetsConfig) -> Self {
        Self::new(config.root.clone(), config.allow_missing)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    fn fallback<T>(
        &self,
        path: &Path,
        result: Result<T, AssetError>,
        placeholder: impl FnOnce() -> T,
    ) -> Result<T, AssetError> {
        match result {
            Err(e) if self.allow_missing && e.is_missing() => {
                log::warn!("{}; using a placeholder for {:?}", e, path);
                Ok(placeholder())
            }
            other => other,
        }
    }

    /// Loads an OBJ mesh, or a unit cube if it is missing
    pub fn mesh(&self, relative: impl AsRef<Path>) -> Result<Mesh, AssetError> {
        let path = self.resolve(relative);
        self.fallback(&path, load_obj(&path), || {
            let mut builder = MeshBuilder::new();
            add_cube(
                &mut builder,
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
                [1.0, 1.0, 1.0, 1.0],
            );
            builder.bake()
        })
    }

    /// Loads an image, or a 1x1 white texture if it is missing
    pub fn texture_2d(&self, relative: impl AsRef<Path>) -> Result<TextureData, AssetError> {
        let path = self.resolve(relative);
        self.fallback(&path, load_texture_2d(&path), || {
            TextureData::solid_color(1, 1, [255, 255, 255, 255])
        })
    }

    /// Loads the six faces of a cube map, or a flat coloured one if any is missing
    pub fn cube_map(&self, relative: impl AsRef<Path>) -> Result<CubeMapData, AssetError> {
        let path = self.resolve(relative);
        self.fallback(&path, load_cube_map(&path), || {
            CubeMapData::solid_color(1, PLACEHOLDER_SKY)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_assets_use_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path(), true);

        let mesh = loader.mesh("models/Chicken1.obj").unwrap();
        assert_eq!(mesh.index_count(), 36);

        let texture = loader.texture_2d("images/grass.jpg").unwrap();
        assert_eq!(texture.pixel(0, 0), Some([255, 255, 255, 255]));

        let sky = loader.cube_map("images/cubemaps/skybox/ocean.jpg").unwrap();
        assert_eq!(sky.face_size(), 1);
    }

    #[test]
    fn test_strict_loader_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path(), false);
        let err = loader.texture_2d("images/grass.jpg").unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_corrupt_file_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let loader = AssetLoader::new(dir.path(), true);
        assert!(matches!(
            loader.texture_2d("broken.png"),
            Err(AssetError::Image { .. })
        ));
    }
}
