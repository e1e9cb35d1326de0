//! Spawning normalized models into the Bevy world

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use mishkat_core::{MaterialDesc, MeshData, NormalizedModel, TextureData};

use crate::types::ModelLoaded;

/// Root of the displayed model; carries the normalization transform
#[derive(Component, Debug)]
pub struct ModelRoot {
    pub triangles: usize,
}

/// One drawable part under [`ModelRoot`]
#[derive(Component, Debug)]
pub struct ModelPart;

/// Plugin for model spawning
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, spawn_loaded_model);
    }
}

pub fn to_bevy_mesh(data: &MeshData) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, data.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, data.normals.clone())
        .with_inserted_indices(Indices::U32(data.indices.clone()));
    if let Some(uvs) = &data.uvs {
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs.clone());
    }
    mesh
}

pub fn to_bevy_image(texture: &TextureData) -> Image {
    Image::new(
        Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        texture.rgba8.clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

pub fn to_standard_material(desc: &MaterialDesc, texture: Option<Handle<Image>>) -> StandardMaterial {
    let [r, g, b, a] = desc.base_color;
    StandardMaterial {
        base_color: Color::linear_rgba(r, g, b, a),
        base_color_texture: texture,
        metallic: desc.metallic,
        perceptual_roughness: desc.roughness,
        double_sided: desc.double_sided,
        cull_mode: if desc.double_sided {
            None
        } else {
            Some(bevy::render::render_resource::Face::Back)
        },
        alpha_mode: if a < 1.0 { AlphaMode::Blend } else { AlphaMode::Opaque },
        ..default()
    }
}

fn spawn_loaded_model(
    mut commands: Commands,
    mut loaded: MessageReader<ModelLoaded>,
    existing: Query<Entity, With<ModelRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(ModelLoaded(model)) = loaded.read().last() else {
        return;
    };

    for entity in &existing {
        commands.entity(entity).despawn();
    }

    spawn_model(&mut commands, model, &mut meshes, &mut materials, &mut images);
}

fn spawn_model(
    commands: &mut Commands,
    model: &NormalizedModel,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
) -> Entity {
    let scene = model.scene();
    let root = Transform::from_matrix(model.root_transform());

    let root_entity = commands
        .spawn((
            root,
            Visibility::default(),
            Name::new("Model"),
            ModelRoot {
                triangles: scene.triangle_count(),
            },
        ))
        .with_children(|parent| {
            for (i, part) in scene.meshes.iter().enumerate() {
                if part.mesh.is_empty() {
                    continue;
                }
                let texture = part
                    .material
                    .base_color_texture
                    .as_ref()
                    .map(|t| images.add(to_bevy_image(t)));
                let name = part.name.clone().unwrap_or_else(|| format!("part-{i}"));
                parent.spawn((
                    Mesh3d(meshes.add(to_bevy_mesh(&part.mesh))),
                    MeshMaterial3d(materials.add(to_standard_material(&part.material, texture))),
                    Transform::from_matrix(part.transform),
                    Name::new(name),
                    ModelPart,
                ));
            }
        })
        .id();

    tracing::info!(
        parts = scene.meshes.len(),
        triangles = scene.triangle_count(),
        scale = model.normalization().scale,
        "Model spawned"
    );
    root_entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::mesh::VertexAttributeValues;
    use mishkat_core::ModelScene;

    fn cube_scene() -> ModelScene {
        let positions = vec![
            [5.0, 5.0, 5.0],
            [15.0, 5.0, 5.0],
            [15.0, 15.0, 5.0],
            [5.0, 15.0, 15.0],
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        ModelScene::single(MeshData::new(positions, indices), MaterialDesc::gold())
    }

    #[test]
    fn test_mesh_conversion() {
        let data = MeshData::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2])
            .with_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mesh = to_bevy_mesh(&data);
        assert_eq!(mesh.count_vertices(), 3);
        assert!(matches!(mesh.indices(), Some(Indices::U32(i)) if i == &vec![0, 1, 2]));
        assert!(matches!(
            mesh.attribute(Mesh::ATTRIBUTE_UV_0),
            Some(VertexAttributeValues::Float32x2(_))
        ));
    }

    #[test]
    fn test_gold_material() {
        let material = to_standard_material(&MaterialDesc::gold(), None);
        assert_eq!(material.metallic, 0.8);
        assert_eq!(material.perceptual_roughness, 0.2);
        assert!(material.double_sided);
        assert_eq!(material.cull_mode, None);
        assert!(matches!(material.alpha_mode, AlphaMode::Opaque));
    }

    #[test]
    fn test_spawned_model_is_normalized() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(AssetPlugin::default())
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_asset::<Image>()
            .add_message::<ModelLoaded>()
            .add_plugins(ModelsPlugin);

        let model = cube_scene().normalize().unwrap();
        app.world_mut().write_message(ModelLoaded(model));
        app.update();

        let world = app.world_mut();
        let (root, transform) = world
            .query::<(&ModelRoot, &Transform)>()
            .single(world)
            .unwrap();
        assert_eq!(root.triangles, 2);
        assert!((transform.scale - Vec3::splat(0.2)).length() < 1e-5);
        assert!((transform.translation - Vec3::splat(-2.0)).length() < 1e-4);
        assert_eq!(world.query::<&ModelPart>().iter(world).count(), 1);
    }
}
