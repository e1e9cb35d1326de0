//! Wavefront OBJ decoding

use std::io::{BufReader, Cursor};

use super::DecodeError;
use crate::geometry::{MeshData, ModelScene, SceneMesh};
use crate::material::MaterialDesc;

/// Decode an OBJ file, one scene mesh per object/group
///
/// Material libraries are not fetched; every part is rendered gold.
pub fn decode(bytes: &[u8]) -> Result<ModelScene, DecodeError> {
    let mut reader = BufReader::new(Cursor::new(bytes));
    let (models, materials) = tobj::load_obj_buf(&mut reader, &tobj::GPU_LOAD_OPTIONS, |path| {
        tracing::debug!(path = %path.display(), "Skipping OBJ material library");
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    if let Err(e) = materials {
        tracing::debug!(error = %e, "OBJ materials unavailable, using default material");
    }

    let mut scene = ModelScene::new();
    for model in models {
        let mesh = model.mesh;
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            continue;
        }

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
        let uvs: Vec<[f32; 2]> = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect();

        let data = MeshData::with_normals(positions, normals, mesh.indices).with_uvs(uvs);
        scene.push(SceneMesh {
            name: (!model.name.is_empty()).then_some(model.name),
            mesh: data,
            material: MaterialDesc::gold(),
            transform: glam::Mat4::IDENTITY,
        });
    }

    if scene.meshes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PARTS: &str = "\
mtllib lantern.mtl
o body
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
usemtl brass
f 1 2 3 4
o cap
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

    #[test]
    fn test_parts_become_gold_meshes() {
        let scene = decode(TWO_PARTS.as_bytes()).unwrap();
        assert_eq!(scene.meshes.len(), 2);
        assert!(scene.meshes.iter().all(|m| m.material.is_gold()));
        assert_eq!(scene.meshes[0].name.as_deref(), Some("body"));
        // quad is triangulated
        assert_eq!(scene.meshes[0].mesh.triangle_count(), 2);
        assert_eq!(scene.meshes[1].mesh.triangle_count(), 1);
    }

    #[test]
    fn test_normals_are_derived_when_missing() {
        let scene = decode(TWO_PARTS.as_bytes()).unwrap();
        let mesh = &scene.meshes[1].mesh;
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert!((mesh.normals[0][2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_faces_is_empty() {
        let err = decode(b"v 0 0 0\nv 1 0 0\n").unwrap_err();
        assert!(matches!(err, DecodeError::Empty));
    }
}
