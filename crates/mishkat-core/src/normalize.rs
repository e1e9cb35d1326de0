//! Fit a decoded model into the viewer's 2-unit working volume

use glam::{Mat4, Quat, Vec3};

use crate::error::ViewerError;
use crate::geometry::{Aabb, ModelScene};

/// Side of the cube the largest model dimension is scaled to
pub const TARGET_SPAN: f32 = 2.0;

/// Root transform derived from the model's own bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Bounds center before normalization
    pub center: Vec3,
    /// Bounds size before normalization
    pub size: Vec3,
    pub scale: f32,
}

impl Normalization {
    /// Translate by `-center`, then scale uniformly
    pub fn from_bounds(bounds: &Aabb) -> Result<Self, ViewerError> {
        let max_dim = bounds.max_dimension();
        if !max_dim.is_finite() || max_dim <= f32::EPSILON {
            return Err(ViewerError::DegenerateGeometry { max_dim });
        }
        Ok(Self {
            center: bounds.center(),
            size: bounds.size(),
            scale: TARGET_SPAN / max_dim,
        })
    }

    /// Root translation once scaling is applied about the origin
    pub fn translation(&self) -> Vec3 {
        -self.center * self.scale
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::IDENTITY,
            self.translation(),
        )
    }
}

/// A scene that has been normalized; construction is the only way to get one
#[derive(Debug, Clone)]
pub struct NormalizedModel {
    scene: ModelScene,
    normalization: Normalization,
}

impl NormalizedModel {
    pub fn scene(&self) -> &ModelScene {
        &self.scene
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn root_transform(&self) -> Mat4 {
        self.normalization.matrix()
    }

    /// Bounds as rendered
    pub fn world_bounds(&self) -> Option<Aabb> {
        let root = self.root_transform();
        self.scene
            .meshes
            .iter()
            .filter_map(|m| m.mesh.bounds(&(root * m.transform)))
            .reduce(|a, b| a.union(&b))
    }

    pub fn into_parts(self) -> (ModelScene, Normalization) {
        (self.scene, self.normalization)
    }
}

impl ModelScene {
    /// Center at the origin and scale so the largest dimension is 2
    pub fn normalize(self) -> Result<NormalizedModel, ViewerError> {
        let bounds = self
            .bounds()
            .ok_or(ViewerError::DegenerateGeometry { max_dim: 0.0 })?;
        let normalization = Normalization::from_bounds(&bounds)?;
        tracing::debug!(
            center = ?normalization.center,
            size = ?normalization.size,
            scale = normalization.scale,
            "Normalized model"
        );
        Ok(NormalizedModel {
            scene: self,
            normalization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MeshData, SceneMesh};
    use crate::material::MaterialDesc;

    fn box_mesh(min: Vec3, max: Vec3) -> MeshData {
        let aabb = Aabb::new(min, max);
        let positions = aabb.corners().map(|c| c.to_array()).to_vec();
        MeshData::new(positions, vec![0, 1, 2, 4, 5, 6, 3, 7, 1])
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_offset_box_is_centered_and_fit() {
        let scene = ModelScene::single(
            box_mesh(Vec3::new(10.0, 10.0, 10.0), Vec3::new(20.0, 15.0, 12.0)),
            MaterialDesc::gold(),
        );
        let model = scene.normalize().unwrap();
        let n = model.normalization();
        assert_close(n.center, Vec3::new(15.0, 12.5, 11.0));
        assert!((n.scale - 0.2).abs() < 1e-6);

        let bounds = model.world_bounds().unwrap();
        assert_close(bounds.center(), Vec3::ZERO);
        assert!((bounds.max_dimension() - TARGET_SPAN).abs() < 1e-4);
        assert_close(bounds.size(), Vec3::new(2.0, 1.0, 0.4));
    }

    #[test]
    fn test_tiny_model_is_scaled_up() {
        let scene = ModelScene::single(
            box_mesh(Vec3::splat(-0.001), Vec3::splat(0.001)),
            MaterialDesc::gold(),
        );
        let model = scene.normalize().unwrap();
        let bounds = model.world_bounds().unwrap();
        assert!((bounds.max_dimension() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_multi_part_model_uses_combined_bounds() {
        let mut scene = ModelScene::new();
        for x in [0.0, 8.0] {
            scene.push(SceneMesh {
                name: None,
                mesh: box_mesh(Vec3::ZERO, Vec3::ONE),
                material: MaterialDesc::gold(),
                transform: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
            });
        }
        let model = scene.normalize().unwrap();
        let bounds = model.world_bounds().unwrap();
        assert_close(bounds.center(), Vec3::ZERO);
        assert_close(bounds.size(), Vec3::new(2.0, 2.0 / 9.0, 2.0 / 9.0));
    }

    #[test]
    fn test_point_model_is_rejected() {
        let scene = ModelScene::single(
            MeshData::new(vec![[1.0, 1.0, 1.0]; 3], vec![0, 1, 2]),
            MaterialDesc::gold(),
        );
        assert!(matches!(
            scene.normalize(),
            Err(ViewerError::DegenerateGeometry { .. })
        ));
        assert!(ModelScene::new().normalize().is_err());
    }

    #[test]
    fn test_non_finite_bounds_are_rejected() {
        let scene = ModelScene::single(
            MeshData::new(
                vec![[0.0, 0.0, 0.0], [f32::INFINITY, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![0, 1, 2],
            ),
            MaterialDesc::gold(),
        );
        assert!(scene.normalize().is_err());
    }
}
