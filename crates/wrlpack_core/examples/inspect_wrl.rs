//! Example: Load and inspect a VRML file.
//!
//! Run with: cargo run --example inspect_wrl -- assets/scene.wrl [--world-space]

use std::env;

use wrlpack_core::{load_vrml, ConvertOptions, FlattenMode};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_wrl <path-to-wrl-file> [--world-space]");
        println!("\nExamples:");
        println!("  cargo run --example inspect_wrl -- assets/scene.wrl");
        println!("  cargo run --example inspect_wrl -- assets/scene.wrl --world-space");
        return;
    }

    let path = &args[1];
    let options = ConvertOptions {
        flatten: if args.iter().any(|a| a == "--world-space") {
            FlattenMode::WorldSpace
        } else {
            FlattenMode::Instanced
        },
        ..Default::default()
    };
    println!("Loading VRML file: {}", path);

    match load_vrml(path, &options) {
        Ok(scene) => {
            println!("\n=== Scene: {} ===", scene.name);
            println!("Meshes: {}", scene.mesh_count());
            println!("Materials: {}", scene.material_count());
            println!("Instances: {}", scene.instance_count());
            println!("Total triangles: {}", scene.total_triangle_count());

            println!("\n--- Meshes ---");
            for (id, mesh) in scene.meshes.iter().enumerate() {
                println!(
                    "  [{}] {} - {} vertices, {} triangles",
                    id,
                    mesh.name,
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                if !mesh.bounds.is_empty() {
                    let (min, max) = (mesh.bounds.min(), mesh.bounds.max());
                    println!(
                        "       Bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
                        min.x, min.y, min.z, max.x, max.y, max.z
                    );
                }
                println!(
                    "       Normals: {}, colors: {}, uvs: {}",
                    mesh.has_normals(),
                    mesh.has_colors(),
                    mesh.has_uvs()
                );
            }

            println!("\n--- Materials ---");
            for (id, material) in scene.materials.iter().enumerate() {
                let d = material.diffuse_color;
                print!(
                    "  [{}] {} - diffuse ({:.2}, {:.2}, {:.2})",
                    id, material.name, d.x, d.y, d.z
                );
                match &material.texture {
                    Some(texture) => println!(", texture {}", texture),
                    None => println!(),
                }
            }

            println!("\n--- Instances ---");
            for (i, instance) in scene.instances.iter().enumerate() {
                let pos = instance
                    .transform
                    .transform_point3(wrlpack_math::Vec3::ZERO);
                println!(
                    "  [{}] {} - mesh {}, material {} at ({:.2}, {:.2}, {:.2})",
                    i, instance.name, instance.mesh_id, instance.material_id, pos.x, pos.y, pos.z
                );
            }

            if !scene.warnings.is_empty() {
                println!("\n--- Warnings ---");
                for warning in &scene.warnings {
                    println!("  {}", warning);
                }
            }

            let world_bounds = scene.world_bounds();
            if !world_bounds.is_empty() {
                let (min, max) = (world_bounds.min(), world_bounds.max());
                println!("\n--- World Bounds ---");
                println!("  Min: ({:.2}, {:.2}, {:.2})", min.x, min.y, min.z);
                println!("  Max: ({:.2}, {:.2}, {:.2})", max.x, max.y, max.z);
                let center = world_bounds.centroid();
                println!("  Center: ({:.2}, {:.2}, {:.2})", center.x, center.y, center.z);
                println!(
                    "  Size: {:.2} x {:.2} x {:.2}",
                    world_bounds.x.size(),
                    world_bounds.y.size(),
                    world_bounds.z.size()
                );
            }
        }
        Err(e) => {
            eprintln!("Error loading VRML file: {}", e);
        }
    }
}
