//! `mishkat inspect`: decode and normalize a model without a renderer

use anyhow::Result;
use mishkat_core::{load_environment, load_model, EnvironmentPhase, NormalizedModel, ViewerConfig};
use std::cell::Cell;

use crate::fetch::NativeFetcher;

/// Load a model (and optionally an HDRI) exactly as the viewer would
pub async fn run(fetcher: &NativeFetcher, config: &ViewerConfig) -> Result<()> {
    let last_reported = Cell::new(0u32);
    let on_progress = |percent: f32| {
        // one line per 10%
        let step = (percent / 10.0) as u32;
        if step > last_reported.get() {
            last_reported.set(step);
            eprintln!("  download {:.0}%", percent);
        }
    };

    let environment_config = config.environment();
    let (model, environment) = tokio::join!(
        load_model(fetcher, config, &on_progress),
        load_environment(fetcher, &environment_config)
    );

    print!("{}", model_report(config, &model?));
    println!("{}", environment_report(&environment));
    Ok(())
}

pub fn model_report(config: &ViewerConfig, model: &NormalizedModel) -> String {
    let scene = model.scene();
    let norm = model.normalization();
    let mut out = String::new();

    out.push_str(&format!("Model: {}\n", config.model_url));
    out.push_str(&format!("  format:     {}\n", config.route().label()));
    out.push_str(&format!(
        "  parts:      {} ({} triangles)\n",
        scene.meshes.len(),
        scene.triangle_count()
    ));
    for (i, part) in scene.meshes.iter().enumerate() {
        let name = part.name.as_deref().unwrap_or("-");
        let material = part.material.name.as_deref().unwrap_or("default");
        out.push_str(&format!(
            "    [{}] {} ({} vertices, material {})\n",
            i,
            name,
            part.mesh.vertex_count(),
            material
        ));
    }
    out.push_str(&format!(
        "  source:     center [{:.3}, {:.3}, {:.3}], size [{:.3}, {:.3}, {:.3}]\n",
        norm.center.x, norm.center.y, norm.center.z, norm.size.x, norm.size.y, norm.size.z
    ));
    out.push_str(&format!("  scale:      {:.6}\n", norm.scale));
    if let Some(bounds) = model.world_bounds() {
        let c = bounds.center();
        out.push_str(&format!(
            "  normalized: center [{:.3}, {:.3}, {:.3}], max dimension {:.3}\n",
            c.x,
            c.y,
            c.z,
            bounds.max_dimension()
        ));
    }
    out
}

pub fn environment_report(phase: &EnvironmentPhase) -> String {
    match phase {
        EnvironmentPhase::Ready(env) => format!(
            "Environment: HDRI {} (intensity {}, blur {:.2}, {}px faces)",
            env.url,
            env.intensity,
            env.blur,
            env.lighting.face_size()
        ),
        EnvironmentPhase::Studio { preset, reason } => format!(
            "Environment: studio preset (intensity {}, {:?})",
            preset.intensity, reason
        ),
        EnvironmentPhase::Loading { url, .. } => format!("Environment: loading {}", url),
    }
}
