//! Surface materials carried alongside decoded meshes

/// Linear-space PBR material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    pub name: Option<String>,
    /// Linear RGBA
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub base_color_texture: Option<TextureData>,
    pub double_sided: bool,
}

/// Decoded RGBA8 texture (sRGB)
#[derive(Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

impl std::fmt::Debug for TextureData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba8.len())
            .finish()
    }
}

/// Gold used for formats that carry no material of their own (#D4AF37)
pub const GOLD_SRGB: [f32; 3] = [0.831, 0.686, 0.216];
pub const GOLD_METALLIC: f32 = 0.8;
pub const GOLD_ROUGHNESS: f32 = 0.2;

impl MaterialDesc {
    /// Default metallic gold
    pub fn gold() -> Self {
        let [r, g, b] = GOLD_SRGB.map(srgb_to_linear);
        Self {
            name: Some("gold".to_string()),
            base_color: [r, g, b, 1.0],
            metallic: GOLD_METALLIC,
            roughness: GOLD_ROUGHNESS,
            base_color_texture: None,
            double_sided: true,
        }
    }

    pub fn is_gold(&self) -> bool {
        self.name.as_deref() == Some("gold")
            && self.metallic == GOLD_METALLIC
            && self.roughness == GOLD_ROUGHNESS
    }
}

impl Default for MaterialDesc {
    /// glTF default material: white, fully metallic, fully rough
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            base_color_texture: None,
            double_sided: false,
        }
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_is_linear_and_metallic() {
        let gold = MaterialDesc::gold();
        assert!(gold.is_gold());
        assert!(gold.base_color[0] < GOLD_SRGB[0]);
        assert!(gold.base_color[0] > gold.base_color[2]);
        assert_eq!(gold.base_color[3], 1.0);
        assert!(!MaterialDesc::default().is_gold());
    }

    #[test]
    fn test_srgb_to_linear() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(0.5) - 0.214).abs() < 1e-3);
    }
}
