//! Byte-level test fixtures built in memory

use base64::Engine;
use serde_json::json;

pub type Triangle = [[f32; 3]; 3];

/// Twelve triangles of an axis-aligned cube spanning `0..size`
pub fn cube_triangles(size: f32) -> Vec<Triangle> {
    let s = size;
    let c = |x: f32, y: f32, z: f32| [x * s, y * s, z * s];
    let quads = [
        [c(0., 0., 0.), c(1., 0., 0.), c(1., 1., 0.), c(0., 1., 0.)],
        [c(0., 0., 1.), c(0., 1., 1.), c(1., 1., 1.), c(1., 0., 1.)],
        [c(0., 0., 0.), c(0., 1., 0.), c(0., 1., 1.), c(0., 0., 1.)],
        [c(1., 0., 0.), c(1., 0., 1.), c(1., 1., 1.), c(1., 1., 0.)],
        [c(0., 0., 0.), c(0., 0., 1.), c(1., 0., 1.), c(1., 0., 0.)],
        [c(0., 1., 0.), c(1., 1., 0.), c(1., 1., 1.), c(0., 1., 1.)],
    ];
    quads
        .iter()
        .flat_map(|q| [[q[0], q[2], q[1]], [q[0], q[3], q[2]]])
        .collect()
}

/// Binary STL with zeroed facet normals
pub fn binary_stl(triangles: &[Triangle]) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    let header = b"binary mishkat fixture";
    bytes[..header.len()].copy_from_slice(header);
    bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for tri in triangles {
        for _ in 0..3 {
            bytes.extend_from_slice(&0f32.to_le_bytes());
        }
        for v in tri {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());
    }
    bytes
}

/// Positions of the fixture triangle as a little-endian f32 buffer
pub fn triangle_positions() -> Vec<u8> {
    [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        .iter()
        .flatten()
        .flat_map(|c| c.to_le_bytes())
        .collect()
}

pub enum BufferPlacement {
    DataUri,
    External(&'static str),
    Glb,
}

/// Triangle under a translated parent node with a scaled child
pub fn triangle_gltf(placement: BufferPlacement) -> String {
    let mut buffer = json!({ "byteLength": 36 });
    match placement {
        BufferPlacement::DataUri => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(triangle_positions());
            buffer["uri"] = json!(format!("data:application/octet-stream;base64,{encoded}"));
        }
        BufferPlacement::External(uri) => buffer["uri"] = json!(uri),
        BufferPlacement::Glb => {}
    }

    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "translation": [10.0, 0.0, 0.0], "children": [1] },
            { "mesh": 0, "scale": [2.0, 2.0, 2.0] }
        ],
        "meshes": [{
            "name": "Triangle",
            "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }]
        }],
        "materials": [{
            "name": "Lacquer",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.5, 0.1, 0.1, 1.0],
                "metallicFactor": 0.1,
                "roughnessFactor": 0.9
            }
        }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "buffers": [buffer]
    })
    .to_string()
}

/// The fixture triangle packed as a GLB container
pub fn triangle_glb() -> Vec<u8> {
    let mut json = triangle_gltf(BufferPlacement::Glb).into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let bin = triangle_positions();

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(b"glTF");
    bytes.extend_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&(total as u32).to_le_bytes());
    bytes.extend_from_slice(&(json.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    bytes.extend_from_slice(&json);
    bytes.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&0x004E_4942u32.to_le_bytes());
    bytes.extend_from_slice(&bin);
    bytes
}

/// Uncompressed Radiance HDR; `texel(x, y)` returns RGBE bytes, row 0 on top
pub fn radiance_hdr(width: u32, height: u32, texel: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
    let mut bytes =
        format!("#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {height} +X {width}\n").into_bytes();
    for y in 0..height {
        for x in 0..width {
            bytes.extend_from_slice(&texel(x, y));
        }
    }
    bytes
}

/// RGBE for 1.0 on every channel
pub const RGBE_ONE: [u8; 4] = [128, 128, 128, 129];
/// RGBE for roughly 0.002 on every channel
pub const RGBE_DIM: [u8; 4] = [128, 128, 128, 120];

/// 8x4 sky: bright upper half, dim lower half
pub fn sky_hdr() -> Vec<u8> {
    radiance_hdr(8, 4, |_, y| if y < 2 { RGBE_ONE } else { RGBE_DIM })
}
