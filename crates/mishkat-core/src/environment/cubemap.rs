//! Equirectangular to cubemap projection and GPU packing

use glam::Vec3;
use half::f16;

use super::hdr::EquirectMap;

/// Cube faces in GPU layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// World direction through face coordinates `u, v` in `-1..=1`,
    /// `v` growing downward
    pub fn direction(&self, u: f32, v: f32) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::new(1.0, -v, -u),
            CubeFace::NegX => Vec3::new(-1.0, -v, u),
            CubeFace::PosY => Vec3::new(u, 1.0, v),
            CubeFace::NegY => Vec3::new(u, -1.0, -v),
            CubeFace::PosZ => Vec3::new(u, -v, 1.0),
            CubeFace::NegZ => Vec3::new(-u, -v, -1.0),
        }
        .normalize()
    }
}

/// Six square faces of linear RGB
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMap {
    face_size: u32,
    texels: Vec<[f32; 3]>,
}

impl CubeMap {
    pub fn from_equirect(map: &EquirectMap, face_size: u32) -> Self {
        let size = face_size.max(1);
        let mut texels = Vec::with_capacity((size * size * 6) as usize);
        for face in CubeFace::ALL {
            for y in 0..size {
                for x in 0..size {
                    let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    texels.push(map.sample(face.direction(u, v)));
                }
            }
        }
        Self {
            face_size: size,
            texels,
        }
    }

    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> [f32; 3] {
        let face_len = (self.face_size * self.face_size) as usize;
        let index = face as usize * face_len + (y * self.face_size + x) as usize;
        self.texels[index]
    }

    /// Face-major RGBA16F bytes, scaled by `intensity`, alpha 1
    ///
    /// Values beyond the half-float range saturate instead of becoming
    /// infinite.
    pub fn to_rgba16f(&self, intensity: f32) -> Vec<u8> {
        let one = f16::ONE.to_le_bytes();
        let mut bytes = Vec::with_capacity(self.texels.len() * 8);
        for t in &self.texels {
            for c in t {
                bytes.extend_from_slice(&to_half(c * intensity).to_le_bytes());
            }
            bytes.extend_from_slice(&one);
        }
        bytes
    }
}

fn to_half(value: f32) -> f16 {
    if value.is_nan() {
        return f16::ZERO;
    }
    f16::from_f32(value.clamp(f16::MIN.to_f32(), f16::MAX.to_f32()))
}
