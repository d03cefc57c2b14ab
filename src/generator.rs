//! Rock generation pipeline
//!
//! ```text
//! Init -> BuildIcosphere -> Displace -> CollapseDecimate -> PlanarDecimate
//!      -> [RemeshFirst -> RemeshSecond -> RemeshDecimate?] -> ApplyScale? -> Done
//! ```
//!
//! Each stage consumes the mesh of the previous one. The configuration is
//! validated before anything is allocated, and every stage's output is
//! validated before the next stage runs, so a call returns either a complete
//! mesh or an error.

use glam::Vec3;
use tracing::{debug, info};

use crate::config::RockConfig;
use crate::error::{Result, RockError};
use crate::generation::IcosphereBuilder;
use crate::mesh::Mesh;
use crate::modifiers::decimate::{collapse, dissolve_planar};
use crate::modifiers::displace;
use crate::modifiers::remesh::{Remesher, VoxelRemesher};

/// Pipeline stages, in execution order
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Init,
    BuildIcosphere,
    Displace,
    CollapseDecimate,
    PlanarDecimate,
    RemeshFirst,
    RemeshSecond,
    RemeshDecimate,
    ApplyScale,
    Done,
}

/// The mesh as it was after one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageSnapshot {
    pub stage: Stage,
    pub mesh: Mesh,
}

/// A generated rock
#[derive(Debug, Clone, PartialEq)]
pub struct Rock {
    /// Final mesh
    pub mesh: Mesh,
    /// Object scale still to be applied by the host, `Vec3::ONE` once baked in
    pub scale: Vec3,
    /// Whether the host should draw the wireframe over the rock
    pub show_wireframe: bool,
    /// Mesh after every executed stage, only kept when requested
    pub history: Vec<StageSnapshot>,
}

impl Rock {
    /// Snapshot of the mesh after `stage`, if it ran and history was kept
    pub fn snapshot(&self, stage: Stage) -> Option<&Mesh> {
        self.history
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| &s.mesh)
    }
}

/// Runs the pipeline with a pluggable remesh backend
///
/// # Example
///
/// ```
/// use low_poly_rock::*;
///
/// let config = RockConfigBuilder::new()
///     .subdivisions(3)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let rock = RockGenerator::new().generate(&config).unwrap();
/// assert!(rock.mesh.face_count() >= 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RockGenerator<R = VoxelRemesher> {
    remesher: R,
}

impl RockGenerator<VoxelRemesher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Remesher> RockGenerator<R> {
    /// Use `remesher` for the optional remesh passes
    pub fn with_remesher(remesher: R) -> Self {
        Self { remesher }
    }

    /// Generate a rock
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` fails validation; no mesh is built
    /// - `DegenerateMesh` if a stage leaves a mesh the next one cannot use
    /// - `NumericInstability` if a stage produces non-finite coordinates
    #[tracing::instrument(skip_all, name = "rock::generate")]
    pub fn generate(&self, config: &RockConfig) -> Result<Rock> {
        config.validate()?;

        let mut run = Run::new(config.output.keep_intermediate);
        let object_transform = config.object_transform();

        let mesh = IcosphereBuilder::build(config.subdivisions, config.radius)?;
        let mesh = run.finish(Stage::BuildIcosphere, mesh)?;

        let mesh = displace::apply(
            mesh,
            &config.effective_displace(),
            &config.effective_noise(),
            object_transform,
        )?;
        let mesh = run.finish(Stage::Displace, mesh)?;

        let mesh = collapse(&mesh, config.decimate.collapse_ratio)?;
        let mesh = run.finish(Stage::CollapseDecimate, mesh)?;

        let mesh = dissolve_planar(&mesh, config.decimate.planar_angle_limit(), true)?;
        let mut mesh = run.finish(Stage::PlanarDecimate, mesh)?;

        let remesh = &config.remesh;
        if remesh.enabled {
            let coarse = self.remesher.remesh(&mesh, &remesh.first)?;
            let coarse = run.finish(Stage::RemeshFirst, coarse)?;

            let fine = self.remesher.remesh(&coarse, &remesh.second)?;
            mesh = run.finish(Stage::RemeshSecond, fine)?;

            if remesh.decimate_ratio < 1.0 {
                let reduced = collapse(&mesh, remesh.decimate_ratio)?;
                mesh = run.finish(Stage::RemeshDecimate, reduced)?;
            }
        }

        let scale = if config.output.apply_scale {
            mesh.transform(object_transform);
            mesh = run.finish(Stage::ApplyScale, mesh)?;
            Vec3::ONE
        } else {
            config.scale
        };

        run.stage = Stage::Done;
        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            remeshed = remesh.enabled,
            "generated rock"
        );

        Ok(Rock {
            mesh,
            scale,
            show_wireframe: config.output.show_wireframe,
            history: run.history,
        })
    }
}

/// Progress of one generation call
struct Run {
    stage: Stage,
    keep: bool,
    history: Vec<StageSnapshot>,
}

impl Run {
    fn new(keep: bool) -> Self {
        Self {
            stage: Stage::Init,
            keep,
            history: Vec::new(),
        }
    }

    /// Check the output of `stage` and record it
    fn finish(&mut self, stage: Stage, mesh: Mesh) -> Result<Mesh> {
        debug_assert!(stage > self.stage);
        mesh.validate().map_err(|e| annotate(stage, e))?;
        if mesh.has_duplicate_faces() {
            return Err(RockError::DegenerateMesh(format!(
                "{:?} produced duplicate faces",
                stage
            )));
        }

        debug!(
            ?stage,
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "stage complete"
        );
        self.stage = stage;
        if self.keep {
            self.history.push(StageSnapshot {
                stage,
                mesh: mesh.clone(),
            });
        }
        Ok(mesh)
    }
}

fn annotate(stage: Stage, err: RockError) -> RockError {
    match err {
        RockError::DegenerateMesh(msg) => {
            RockError::DegenerateMesh(format!("after {:?}: {}", stage, msg))
        }
        RockError::NumericInstability(msg) => {
            RockError::NumericInstability(format!("after {:?}: {}", stage, msg))
        }
        other => other,
    }
}

/// Generate the mesh of a rock
///
/// Shorthand for [`RockGenerator::generate`] with the built-in remesher,
/// keeping only the mesh.
///
/// # Errors
///
/// Same as [`RockGenerator::generate`]
pub fn generate(config: &RockConfig) -> Result<Mesh> {
    RockGenerator::new().generate(config).map(|rock| rock.mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputOptions, RemeshConfig, RemeshMode, RemeshPass, RockConfigBuilder};
    use tracing_test::traced_test;

    fn small_config() -> RockConfig {
        RockConfigBuilder::new()
            .subdivisions(3)
            .unwrap()
            .build()
            .unwrap()
    }

    /// Returns the input unchanged and counts its calls
    #[derive(Default)]
    struct PassThrough(std::cell::Cell<usize>);

    impl Remesher for PassThrough {
        fn remesh(&self, mesh: &Mesh, _pass: &RemeshPass) -> Result<Mesh> {
            self.0.set(self.0.get() + 1);
            Ok(mesh.clone())
        }
    }

    /// Always yields an empty mesh
    struct Vanishing;

    impl Remesher for Vanishing {
        fn remesh(&self, _mesh: &Mesh, _pass: &RemeshPass) -> Result<Mesh> {
            Ok(Mesh::default())
        }
    }

    #[test]
    fn test_generate_default_stages() {
        let config = RockConfig {
            output: OutputOptions {
                keep_intermediate: true,
                ..Default::default()
            },
            ..small_config()
        };

        let rock = RockGenerator::new().generate(&config).unwrap();
        let stages: Vec<Stage> = rock.history.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::BuildIcosphere,
                Stage::Displace,
                Stage::CollapseDecimate,
                Stage::PlanarDecimate,
                Stage::ApplyScale,
            ]
        );

        let base = rock.snapshot(Stage::BuildIcosphere).unwrap();
        assert_eq!(base.face_count(), 1280);
        let displaced = rock.snapshot(Stage::Displace).unwrap();
        assert_eq!(displaced.faces, base.faces);
        assert_ne!(displaced.positions, base.positions);
        assert_eq!(rock.snapshot(Stage::RemeshFirst), None);
    }

    #[test]
    fn test_history_off_by_default() {
        let rock = RockGenerator::new().generate(&small_config()).unwrap();
        assert!(rock.history.is_empty());
        assert!(rock.show_wireframe);
        assert_eq!(rock.scale, Vec3::ONE);
    }

    #[test]
    fn test_pending_scale() {
        let scale = Vec3::new(1.0, 0.5, 2.0);
        let mut config = small_config();
        config.scale = scale;

        config.output.apply_scale = false;
        let unscaled = RockGenerator::new().generate(&config).unwrap();
        assert_eq!(unscaled.scale, scale);

        config.output.apply_scale = true;
        let scaled = RockGenerator::new().generate(&config).unwrap();
        assert_eq!(scaled.scale, Vec3::ONE);

        // The displacement samples in object space, so only the baking differs
        assert_eq!(scaled.mesh.faces, unscaled.mesh.faces);
        for (a, b) in scaled.mesh.positions.iter().zip(&unscaled.mesh.positions) {
            assert!((*a - *b * scale).length() < 1e-5);
        }
    }

    #[test]
    fn test_custom_remesher() {
        let mut config = small_config();
        config.remesh = RemeshConfig {
            enabled: true,
            decimate_ratio: 0.5,
            ..Default::default()
        };
        config.output.keep_intermediate = true;

        let generator = RockGenerator::with_remesher(PassThrough::default());
        let rock = generator.generate(&config).unwrap();

        assert_eq!(generator.remesher.0.get(), 2);
        let planar = rock.snapshot(Stage::PlanarDecimate).unwrap();
        assert_eq!(rock.snapshot(Stage::RemeshSecond), Some(planar));
        assert!(rock.snapshot(Stage::RemeshDecimate).is_some());
    }

    #[test]
    fn test_voxel_remesh_stage() {
        let mut config = small_config();
        config.remesh = RemeshConfig {
            enabled: true,
            first: RemeshPass::new(RemeshMode::Blocks, 3, 0.99),
            second: RemeshPass::new(RemeshMode::Smooth, 3, 0.99),
            decimate_ratio: 1.0,
        };

        let mesh = generate(&config).unwrap();
        assert!(mesh.validate().is_ok());
        assert!(mesh.faces.iter().all(|f| f.len() == 4));
    }

    #[test]
    fn test_empty_remesh_aborts() {
        let mut config = small_config();
        config.remesh.enabled = true;

        let result = RockGenerator::with_remesher(Vanishing).generate(&config);
        match result {
            Err(RockError::DegenerateMesh(msg)) => assert!(msg.contains("RemeshFirst")),
            other => panic!("expected DegenerateMesh, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_rejected_first() {
        let mut config = small_config();
        config.radius = 0.0;

        let generator = RockGenerator::with_remesher(PassThrough::default());
        let result = generator.generate(&config);
        assert!(matches!(result, Err(RockError::InvalidConfig(_))));
        assert_eq!(generator.remesher.0.get(), 0);
    }

    #[test]
    #[traced_test]
    fn test_logs_stages() {
        generate(&small_config()).unwrap();
        assert!(logs_contain("stage complete"));
        assert!(logs_contain("generated rock"));
    }
}
