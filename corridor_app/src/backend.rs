//! Headless render backend that validates and logs what the engine submits

use std::collections::HashMap;

use flight_engine::assets::ModelHandle;
use flight_engine::foundation::math::{Mat4, RawMat4};
use flight_engine::render::{BackendResult, CameraUniform, RenderBackend, RenderError};

/// Per-frame totals, kept for the shutdown summary
#[derive(Debug, Clone, Default)]
pub struct BackendStats {
    /// Frames presented
    pub frames: u64,
    /// Draw calls across all frames
    pub draws: u64,
    /// Bone matrices uploaded across all frames
    pub bone_matrices: u64,
}

/// Backend that checks frame sequencing and logs instead of drawing
pub struct LoggingBackend {
    max_bones: usize,
    in_frame: bool,
    camera: Option<CameraUniform>,
    draws_by_model: HashMap<ModelHandle, u32>,
    stats: BackendStats,
}

impl LoggingBackend {
    /// Backend accepting palettes of up to `max_bones` matrices
    pub fn new(max_bones: usize) -> Self {
        Self {
            max_bones,
            in_frame: false,
            camera: None,
            draws_by_model: HashMap::new(),
            stats: BackendStats::default(),
        }
    }

    /// Totals so far
    pub fn stats(&self) -> &BackendStats {
        &self.stats
    }

    /// Camera block of the last frame
    pub fn camera(&self) -> Option<&CameraUniform> {
        self.camera.as_ref()
    }
}

impl RenderBackend for LoggingBackend {
    fn begin_frame(&mut self, view: &RawMat4, projection: &RawMat4) -> BackendResult<()> {
        if self.in_frame {
            return Err(RenderError::FrameState("begin_frame inside an open frame".to_string()));
        }
        self.in_frame = true;
        self.draws_by_model.clear();
        self.camera = Some(CameraUniform::new(&Mat4::from(*view), &Mat4::from(*projection)));
        Ok(())
    }

    fn draw_model(&mut self, model: ModelHandle, model_matrix: &RawMat4) -> BackendResult<()> {
        if !self.in_frame {
            return Err(RenderError::FrameState("draw_model outside a frame".to_string()));
        }
        log::trace!("draw {:?} at {:?}", model, model_matrix[3]);
        *self.draws_by_model.entry(model).or_default() += 1;
        self.stats.draws += 1;
        Ok(())
    }

    fn upload_bone_matrices(&mut self, model: ModelHandle, matrices: &[RawMat4]) -> BackendResult<()> {
        if matrices.len() > self.max_bones {
            return Err(RenderError::TooManyBones {
                count: matrices.len(),
                max: self.max_bones,
            });
        }
        log::trace!("upload {} bone matrices for {:?}", matrices.len(), model);
        self.stats.bone_matrices += matrices.len() as u64;
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if !self.in_frame {
            return Err(RenderError::FrameState("end_frame without begin_frame".to_string()));
        }
        self.in_frame = false;
        self.stats.frames += 1;
        if self.stats.frames % 120 == 0 {
            let mut draws: Vec<_> = self.draws_by_model.iter().collect();
            draws.sort_by_key(|(handle, _)| handle.0);
            log::debug!("frame {}: draws per model {:?}", self.stats.frames, draws);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: RawMat4 = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]];

    #[test]
    fn test_sequencing_is_enforced() {
        let mut backend = LoggingBackend::new(4);
        assert!(matches!(backend.draw_model(ModelHandle(1), &IDENTITY), Err(RenderError::FrameState(_))));
        assert!(matches!(backend.end_frame(), Err(RenderError::FrameState(_))));

        backend.begin_frame(&IDENTITY, &IDENTITY).unwrap();
        assert!(backend.begin_frame(&IDENTITY, &IDENTITY).is_err());
        backend.draw_model(ModelHandle(1), &IDENTITY).unwrap();
        backend.end_frame().unwrap();

        assert_eq!(backend.stats().frames, 1);
        assert_eq!(backend.stats().draws, 1);
        assert_eq!(backend.camera().map(|c| c.view_projection), Some(IDENTITY));
    }

    #[test]
    fn test_oversized_palette_is_rejected() {
        let mut backend = LoggingBackend::new(2);
        let palette = vec![IDENTITY; 3];
        assert_eq!(
            backend.upload_bone_matrices(ModelHandle(4), &palette),
            Err(RenderError::TooManyBones { count: 3, max: 2 })
        );
    }
}
