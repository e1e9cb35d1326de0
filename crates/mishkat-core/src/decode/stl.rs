//! STL decoding (binary and ASCII)

use std::io::Cursor;

use super::DecodeError;
use crate::geometry::{MeshData, ModelScene};
use crate::material::MaterialDesc;

/// Decode an STL file into a single gold mesh
///
/// Vertices are shared through the indexed form `stl_io` produces, so
/// normals come out smooth across adjacent faces.
pub fn decode(bytes: &[u8]) -> Result<ModelScene, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let stl = stl_io::read_stl(&mut cursor).map_err(DecodeError::Stl)?;

    if stl.faces.is_empty() {
        return Err(DecodeError::Empty);
    }

    let positions: Vec<[f32; 3]> = stl.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect();
    let indices: Vec<u32> = stl
        .faces
        .iter()
        .flat_map(|face| face.vertices.iter().map(|&i| i as u32))
        .collect();

    Ok(ModelScene::single(
        MeshData::new(positions, indices),
        MaterialDesc::gold(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_binary_cube() {
        let bytes = fixtures::binary_stl(&fixtures::cube_triangles(2.0));
        let scene = decode(&bytes).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.mesh.triangle_count(), 12);
        assert_eq!(mesh.mesh.vertex_count(), 8);
        assert!(mesh.material.is_gold());

        let bounds = scene.bounds().unwrap();
        assert_eq!(bounds.size(), glam::Vec3::splat(2.0));
    }

    #[test]
    fn test_ascii_triangle() {
        let text = "solid tri\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            vertex 0 1 0\n\
            endloop\n\
            endfacet\n\
            endsolid tri\n";
        let scene = decode(text.as_bytes()).unwrap();
        assert_eq!(scene.triangle_count(), 1);
        assert!(scene.meshes[0].material.is_gold());
    }

    #[test]
    fn test_truncated_binary_fails() {
        let bytes = fixtures::binary_stl(&fixtures::cube_triangles(1.0));
        assert!(decode(&bytes[..100]).is_err());
    }
}
