//! Wavefront OBJ loading through [`tobj`]

use std::io::BufRead;
use std::path::Path;

use crate::gfx::geometry::{calculate_smooth_normals, Mesh, MeshBuilder, VertexPosNormTexCol};

use super::AssetError;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Loads every model in an OBJ file into one mesh
///
/// Material libraries are ignored; textures are bound through materials.
pub fn load_obj(path: &Path) -> Result<Mesh, AssetError> {
    if !path.exists() {
        return Err(AssetError::not_found(path));
    }
    let (models, _materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| AssetError::Obj {
            path: path.to_path_buf(),
            source,
        })?;
    let builder = builder_from_models(&models, path)?;
    log::info!(
        "Loaded OBJ {:?}: {} vertices, {} triangles",
        path,
        builder.vertex_count(),
        builder.triangle_count()
    );
    Ok(builder.bake())
}

/// Parses OBJ text from a reader; `origin` is only used in error messages
pub fn parse_obj<R: BufRead>(reader: &mut R, origin: &Path) -> Result<MeshBuilder, AssetError> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(|source| AssetError::Obj {
                path: origin.to_path_buf(),
                source,
            })?;
    builder_from_models(&models, origin)
}

fn builder_from_models(models: &[tobj::Model], origin: &Path) -> Result<MeshBuilder, AssetError> {
    let mut builder = MeshBuilder::new();

    for model in models {
        let mesh = &model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        let normals: Vec<[f32; 3]> = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect()
        } else {
            log::debug!("OBJ model '{}' has no normals, computing them", model.name);
            calculate_smooth_normals(&positions, &mesh.indices)
        };

        let has_uvs = mesh.texcoords.len() / 2 == positions.len();
        let base = builder.vertex_count() as u32;
        for (i, position) in positions.iter().enumerate() {
            // OBJ puts the V origin at the bottom of the image
            let uv = if has_uvs {
                [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            };
            builder.add_vertex(VertexPosNormTexCol::new(*position, normals[i], uv, WHITE));
        }
        for tri in mesh.indices.chunks_exact(3) {
            builder.add_index_tri(base + tri[0], base + tri[1], base + tri[2]);
        }
    }

    if builder.triangle_count() == 0 {
        return Err(AssetError::EmptyMesh(origin.to_path_buf()));
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_quad_is_triangulated_with_computed_normals() {
        let builder = parse_obj(&mut Cursor::new(QUAD), Path::new("quad.obj")).unwrap();
        assert_eq!(builder.vertex_count(), 4);
        assert_eq!(builder.triangle_count(), 2);
        for vertex in builder.vertices() {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
        // V is flipped for top-left texture origin
        assert_eq!(builder.vertices()[0].uv, [0.0, 1.0]);
        assert_eq!(builder.vertices()[2].uv, [1.0, 0.0]);
    }

    #[test]
    fn test_models_are_merged_with_offset_indices() {
        let src = "\
o a
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o b
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let builder = parse_obj(&mut Cursor::new(src), Path::new("two.obj")).unwrap();
        assert_eq!(builder.vertex_count(), 6);
        assert_eq!(&builder.indices()[3..], &[3, 4, 5]);
    }

    #[test]
    fn test_file_without_faces_is_rejected() {
        let err = parse_obj(&mut Cursor::new("v 0 0 0\n"), Path::new("dots.obj")).unwrap_err();
        assert!(matches!(err, AssetError::EmptyMesh(_)));
    }

    #[test]
    fn test_load_obj_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD).unwrap();
        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.index_count(), 6);

        assert!(load_obj(&dir.path().join("missing.obj"))
            .unwrap_err()
            .is_missing());
    }
}
