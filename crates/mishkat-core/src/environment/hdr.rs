//! Equirectangular HDR images

use glam::Vec3;
use image::ImageFormat;
use std::f32::consts::PI;

use super::HdriError;

/// Linear RGB equirectangular map
///
/// Rows are stored in texture order after [`EquirectMap::flip_vertical`]:
/// row 0 is the nadir and the last row the zenith.
#[derive(Debug, Clone, PartialEq)]
pub struct EquirectMap {
    width: u32,
    height: u32,
    texels: Vec<[f32; 3]>,
}

impl EquirectMap {
    pub fn new(width: u32, height: u32, texels: Vec<[f32; 3]>) -> Result<Self, HdriError> {
        if width == 0 || height == 0 || texels.len() != (width * height) as usize {
            return Err(HdriError::Empty);
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Decode Radiance RGBE bytes; rows come out top first
    pub fn decode(bytes: &[u8]) -> Result<Self, HdriError> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)?.to_rgb32f();
        let (width, height) = img.dimensions();
        let texels = img.pixels().map(|p| p.0).collect();
        Self::new(width, height, texels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 3] {
        self.texels[(y * self.width + x) as usize]
    }

    /// Reverse row order in place
    pub fn flip_vertical(&mut self) {
        let w = self.width as usize;
        let h = self.height as usize;
        for y in 0..h / 2 {
            let (top, bottom) = self.texels.split_at_mut((h - 1 - y) * w);
            top[y * w..(y + 1) * w].swap_with_slice(&mut bottom[..w]);
        }
    }

    /// Bilinear lookup along a world direction (Y up)
    pub fn sample(&self, dir: Vec3) -> [f32; 3] {
        let d = dir.normalize_or(Vec3::Y);
        let u = 0.5 + d.z.atan2(d.x) / (2.0 * PI);
        let v = 1.0 - d.y.clamp(-1.0, 1.0).acos() / PI;

        let fx = u * self.width as f32 - 0.5;
        let fy = (v * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let w = self.width as i64;
        let wrap = |x: i64| x.rem_euclid(w) as u32;
        let (xa, xb) = (wrap(x0 as i64), wrap(x0 as i64 + 1));
        let ya = y0 as u32;
        let yb = (ya + 1).min(self.height - 1);

        let lerp = |a: [f32; 3], b: [f32; 3], t: f32| {
            [
                a[0] + (b[0] - a[0]) * t,
                a[1] + (b[1] - a[1]) * t,
                a[2] + (b[2] - a[2]) * t,
            ]
        };
        let top = lerp(self.texel(xa, ya), self.texel(xb, ya), tx);
        let bottom = lerp(self.texel(xa, yb), self.texel(xb, yb), tx);
        lerp(top, bottom, ty)
    }

    /// Separable box blur; `factor` in `0..=1` scales the kernel up to a
    /// quarter of the map width
    pub fn blurred(&self, factor: f32) -> Self {
        let max_radius = (self.width.saturating_sub(1) / 2) as usize;
        let radius = ((factor.clamp(0.0, 1.0) * self.width as f32 / 4.0).round() as usize)
            .min(max_radius);
        if radius == 0 {
            return self.clone();
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let norm = 1.0 / (2 * radius + 1) as f32;
        let mut horizontal = vec![[0.0f32; 3]; w * h];

        // Longitude wraps around
        for y in 0..h {
            let row = &self.texels[y * w..(y + 1) * w];
            let at = |i: isize| row[i.rem_euclid(w as isize) as usize];
            let mut sum = [0.0f32; 3];
            for k in -(radius as isize)..=(radius as isize) {
                add(&mut sum, at(k), 1.0);
            }
            for x in 0..w {
                horizontal[y * w + x] = sum.map(|c| c * norm);
                add(&mut sum, at(x as isize + radius as isize + 1), 1.0);
                add(&mut sum, at(x as isize - radius as isize), -1.0);
            }
        }

        // Latitude clamps at the poles
        let mut texels = vec![[0.0f32; 3]; w * h];
        for x in 0..w {
            let at = |i: isize| horizontal[i.clamp(0, h as isize - 1) as usize * w + x];
            let mut sum = [0.0f32; 3];
            for k in -(radius as isize)..=(radius as isize) {
                add(&mut sum, at(k), 1.0);
            }
            for y in 0..h {
                texels[y * w + x] = sum.map(|c| c * norm);
                add(&mut sum, at(y as isize + radius as isize + 1), 1.0);
                add(&mut sum, at(y as isize - radius as isize), -1.0);
            }
        }

        Self {
            width: self.width,
            height: self.height,
            texels,
        }
    }

    pub fn average(&self) -> [f32; 3] {
        let mut sum = [0.0f32; 3];
        for t in &self.texels {
            add(&mut sum, *t, 1.0);
        }
        let n = self.texels.len() as f32;
        sum.map(|c| c / n)
    }
}

fn add(sum: &mut [f32; 3], value: [f32; 3], sign: f32) {
    for (s, v) in sum.iter_mut().zip(value) {
        *s += v * sign;
    }
}
