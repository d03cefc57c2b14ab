//! Example: Generate a rock and write it as OBJ
//!
//! The mesh goes to stdout, progress to stderr:
//!
//! ```text
//! RUST_LOG=low_poly_rock=debug cargo run --example generate_rock > rock.obj
//! ```

use std::io;

use low_poly_rock::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // A flattened, slightly elongated boulder
    let config = RockConfigBuilder::new()
        .seed(42)
        .subdivisions(4)
        .unwrap()
        .scale(Vec3::new(1.2, 0.7, 1.0))
        .unwrap()
        .collapse_ratio(0.06)
        .unwrap()
        .build()
        .unwrap();

    eprintln!("Configuration:");
    eprintln!("  Subdivisions: {}", config.subdivisions);
    eprintln!("  Radius: {}", config.radius);
    eprintln!("  Scale: {:?}", config.scale);
    eprintln!("  Collapse ratio: {}", config.decimate.collapse_ratio);
    eprintln!("  Remesh: {}", config.remesh.enabled);

    let rock = RockGenerator::new()
        .generate(&config)
        .expect("Failed to generate rock");

    let stats = rock.mesh.edge_stats();
    eprintln!();
    eprintln!("Statistics:");
    eprintln!("  Vertices: {}", rock.mesh.vertex_count());
    eprintln!("  Faces: {}", rock.mesh.face_count());
    eprintln!("  Triangles: {}", rock.mesh.to_mesh_data().triangle_count());
    eprintln!("  Boundary edges: {}", stats.boundary);
    eprintln!("  Non-manifold edges: {}", stats.non_manifold);

    write_obj(&rock.mesh, "rock", io::stdout().lock()).expect("Failed to write OBJ");
}
