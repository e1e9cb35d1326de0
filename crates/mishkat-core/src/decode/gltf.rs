//! GLB and glTF decoding
//!
//! Walks the default scene's node hierarchy and emits one scene mesh per
//! triangle primitive, with the node's world transform and the primitive's
//! PBR material. Buffers and images may live in the GLB binary chunk, in
//! base64 `data:` URIs, or in side files supplied by the loader.

use base64::Engine;
use glam::Mat4;
use gltf::{buffer, image::Source as ImageSource, mesh::Mode, Gltf};
use std::borrow::Cow;
use std::collections::HashMap;

use super::{DecodeError, ExternalResources};
use crate::geometry::{MeshData, ModelScene, SceneMesh};
use crate::material::{MaterialDesc, TextureData};

const MAX_NODE_DEPTH: usize = 128;

/// Relative URIs of the side files a glTF needs
pub fn external_uris(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    let gltf = Gltf::from_slice(bytes)?;
    let mut uris: Vec<String> = Vec::new();

    let buffer_uris = gltf.document.buffers().filter_map(|b| match b.source() {
        buffer::Source::Uri(uri) => Some(uri),
        buffer::Source::Bin => None,
    });
    let image_uris = gltf.document.images().filter_map(|i| match i.source() {
        ImageSource::Uri { uri, .. } => Some(uri),
        ImageSource::View { .. } => None,
    });

    for uri in buffer_uris.chain(image_uris) {
        if !is_data_uri(uri) && !uris.iter().any(|u| u == uri) {
            uris.push(uri.to_string());
        }
    }
    Ok(uris)
}

pub fn decode(bytes: &[u8], externals: &ExternalResources) -> Result<ModelScene, DecodeError> {
    let Gltf { document, blob } = Gltf::from_slice(bytes)?;
    let buffers = load_buffers(&document, blob, externals)?;

    let mut builder = SceneBuilder {
        buffers: &buffers,
        externals,
        materials: HashMap::new(),
        scene: ModelScene::new(),
    };

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                builder.visit(node, Mat4::IDENTITY, 0);
            }
        }
        None => {
            for mesh in document.meshes() {
                builder.append_mesh(&mesh, Mat4::IDENTITY);
            }
        }
    }

    Ok(builder.scene)
}

struct SceneBuilder<'a> {
    buffers: &'a [Vec<u8>],
    externals: &'a ExternalResources,
    materials: HashMap<Option<usize>, MaterialDesc>,
    scene: ModelScene,
}

impl SceneBuilder<'_> {
    fn visit(&mut self, node: gltf::Node<'_>, parent: Mat4, depth: usize) {
        if depth > MAX_NODE_DEPTH {
            tracing::warn!(node = node.index(), "glTF node hierarchy too deep, truncating");
            return;
        }
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            self.append_mesh(&mesh, world);
        }
        for child in node.children() {
            self.visit(child, world, depth + 1);
        }
    }

    fn append_mesh(&mut self, mesh: &gltf::Mesh<'_>, world: Mat4) {
        let buffers = self.buffers;
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                tracing::debug!(mode = ?primitive.mode(), "Skipping non-triangle primitive");
                continue;
            }

            let reader = primitive.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();
            let uvs: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().collect());
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let mut data = MeshData::with_normals(positions, normals, indices);
            if let Some(uvs) = uvs {
                data = data.with_uvs(uvs);
            }

            let material = self.material(&primitive.material());
            self.scene.push(SceneMesh {
                name: mesh.name().map(str::to_string),
                mesh: data,
                material,
                transform: world,
            });
        }
    }

    fn material(&mut self, material: &gltf::Material<'_>) -> MaterialDesc {
        if let Some(cached) = self.materials.get(&material.index()) {
            return cached.clone();
        }

        let pbr = material.pbr_metallic_roughness();
        let texture = pbr.base_color_texture().and_then(|info| {
            let image = info.texture().source();
            let bytes = image_bytes(image.source(), self.buffers, self.externals)?;
            decode_texture(&bytes, image.index())
        });
        let desc = MaterialDesc {
            name: material.name().map(str::to_string),
            base_color: pbr.base_color_factor(),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            base_color_texture: texture,
            double_sided: material.double_sided(),
        };
        self.materials.insert(material.index(), desc.clone());
        desc
    }
}

fn load_buffers(
    document: &gltf::Document,
    mut blob: Option<Vec<u8>>,
    externals: &ExternalResources,
) -> Result<Vec<Vec<u8>>, DecodeError> {
    let mut buffers = Vec::new();
    for buffer in document.buffers() {
        let index = buffer.index();
        let data = match buffer.source() {
            buffer::Source::Bin => blob.take().ok_or_else(|| DecodeError::MissingBuffer {
                index,
                uri: "GLB binary chunk".to_string(),
            })?,
            buffer::Source::Uri(uri) if is_data_uri(uri) => decode_data_uri(uri)?,
            buffer::Source::Uri(uri) => {
                externals
                    .get(uri)
                    .cloned()
                    .ok_or_else(|| DecodeError::MissingBuffer {
                        index,
                        uri: uri.to_string(),
                    })?
            }
        };
        if data.len() < buffer.length() {
            return Err(DecodeError::ShortBuffer {
                index,
                expected: buffer.length(),
                actual: data.len(),
            });
        }
        buffers.push(data);
    }
    Ok(buffers)
}

fn image_bytes<'a>(
    source: ImageSource<'_>,
    buffers: &'a [Vec<u8>],
    externals: &'a ExternalResources,
) -> Option<Cow<'a, [u8]>> {
    match source {
        ImageSource::View { view, .. } => {
            let data = buffers.get(view.buffer().index())?;
            data.get(view.offset()..view.offset() + view.length())
                .map(Cow::Borrowed)
        }
        ImageSource::Uri { uri, .. } if is_data_uri(uri) => match decode_data_uri(uri) {
            Ok(bytes) => Some(Cow::Owned(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping embedded image");
                None
            }
        },
        ImageSource::Uri { uri, .. } => externals.get(uri).map(|b| Cow::Borrowed(b.as_slice())),
    }
}

fn decode_texture(bytes: &[u8], image_index: usize) -> Option<TextureData> {
    match image::load_from_memory(bytes) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            Some(TextureData {
                width: rgba.width(),
                height: rgba.height(),
                rgba8: rgba.into_raw(),
            })
        }
        Err(e) => {
            tracing::warn!(image = image_index, error = %e, "Failed to decode glTF texture");
            None
        }
    }
}

pub(crate) fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decode a base64 `data:` URI
pub(crate) fn decode_data_uri(uri: &str) -> Result<Vec<u8>, DecodeError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| DecodeError::DataUri("missing data: scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| DecodeError::DataUri("missing ',' separator".into()))?;
    if !meta.ends_with(";base64") {
        return Err(DecodeError::DataUri(format!(
            "only base64 payloads are supported (got '{meta}')"
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::DataUri(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use glam::Vec3;

    #[test]
    fn test_node_hierarchy_and_material() {
        let json = fixtures::triangle_gltf(fixtures::BufferPlacement::DataUri);
        let scene = decode(json.as_bytes(), &ExternalResources::new()).unwrap();
        assert_eq!(scene.meshes.len(), 1);

        let part = &scene.meshes[0];
        assert_eq!(part.name.as_deref(), Some("Triangle"));
        assert_eq!(part.material.name.as_deref(), Some("Lacquer"));
        assert_eq!(part.material.base_color, [0.5, 0.1, 0.1, 1.0]);
        assert!((part.material.metallic - 0.1).abs() < 1e-6);
        assert!((part.material.roughness - 0.9).abs() < 1e-6);
        assert!(!part.material.is_gold());

        // parent translates by 10 on X, child scales by 2
        let bounds = scene.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(12.0, 2.0, 0.0));
        assert_eq!(part.mesh.indices, vec![0, 1, 2]);
        assert!((Vec3::from(part.mesh.normals[0]) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_glb_binary_chunk() {
        let glb = fixtures::triangle_glb();
        let scene = decode(&glb, &ExternalResources::new()).unwrap();
        assert_eq!(scene.triangle_count(), 1);
        assert_eq!(scene.bounds().unwrap().max, Vec3::new(12.0, 2.0, 0.0));
    }

    #[test]
    fn test_external_buffer() {
        let json = fixtures::triangle_gltf(fixtures::BufferPlacement::External("tri.bin"));
        assert_eq!(external_uris(json.as_bytes()).unwrap(), vec!["tri.bin".to_string()]);

        let missing = decode(json.as_bytes(), &ExternalResources::new()).unwrap_err();
        assert!(matches!(missing, DecodeError::MissingBuffer { index: 0, .. }));

        let mut externals = ExternalResources::new();
        externals.insert("tri.bin".into(), fixtures::triangle_positions());
        let scene = decode(json.as_bytes(), &externals).unwrap();
        assert_eq!(scene.triangle_count(), 1);

        externals.insert("tri.bin".into(), vec![0u8; 8]);
        assert!(matches!(
            decode(json.as_bytes(), &externals),
            Err(DecodeError::ShortBuffer { expected: 36, actual: 8, .. })
        ));
    }

    #[test]
    fn test_embedded_buffers_need_no_externals() {
        let json = fixtures::triangle_gltf(fixtures::BufferPlacement::DataUri);
        assert!(external_uris(json.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(
            decode_data_uri("data:application/octet-stream;base64,AAEC").unwrap(),
            vec![0, 1, 2]
        );
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("data:;base64").is_err());
    }
}
