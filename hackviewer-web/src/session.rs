//! One mounted viewer: scene, surface, and the state machines that drive them.
//!
//! Everything here is synchronous and target-independent. The browser glue
//! only forwards events and frame callbacks into a [`ViewerSession`].

use hackviewer_wgpu::RenderError;

use crate::builder::SceneGraph;
use crate::config::ViewerConfig;
use crate::input::{DragTracker, PointerPos, ViewportRect};
use crate::loader::{LoadOutcome, PendingLoad};
use crate::render_loop::FrameScheduler;
use crate::resize::ViewportReactor;
use crate::surface::RenderSurface;
use crate::transform::ModelTransform;

pub struct ViewerSession<S: RenderSurface> {
    scene: SceneGraph,
    surface: S,
    idle_spin: f32,
    drag_sensitivity: f32,
    loading: bool,
    disposed: bool,
    pending: Option<PendingLoad>,
    drag: DragTracker,
    scheduler: FrameScheduler,
    viewport: ViewportReactor,
}

impl<S: RenderSurface> ViewerSession<S> {
    /// `surface` must already be sized to `width` x `height`. The session
    /// starts in the loading state with its frame loop running.
    pub fn new(config: &ViewerConfig, scene: SceneGraph, surface: S, width: u32, height: u32) -> Self {
        Self {
            scene,
            surface,
            idle_spin: config.idle_spin,
            drag_sensitivity: config.drag_sensitivity,
            loading: true,
            disposed: false,
            pending: None,
            drag: DragTracker::new(),
            scheduler: FrameScheduler::new(),
            viewport: ViewportReactor::with_size(width, height),
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn transform(&self) -> &ModelTransform {
        &self.scene.transform
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Progress of the current load; 1.0 once it has finished.
    pub fn load_progress(&self) -> f32 {
        match self.pending {
            Some(pending) => pending.progress(),
            None if self.loading => 0.0,
            None => 1.0,
        }
    }

    // ── Loading ──

    /// Register the one in-flight load. Returns false if a load is already
    /// pending or the session is gone.
    pub fn begin_load(&mut self) -> bool {
        if self.disposed || self.pending.is_some() {
            return false;
        }
        self.pending = Some(PendingLoad::new());
        self.loading = true;
        true
    }

    pub fn report_progress(&mut self, fraction: f32) {
        if let Some(pending) = self.pending.as_mut() {
            if pending.advance(fraction) {
                log::debug!("Model loading: {:.0}%", pending.progress() * 100.0);
            }
        }
    }

    /// Install the load result, or the fallback sphere if it failed or
    /// cannot be normalized. Results arriving after teardown are dropped.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> bool {
        if self.disposed {
            log::debug!("Discarding load result that arrived after teardown");
            return false;
        }
        self.pending = None;

        match outcome {
            LoadOutcome::Loaded(model) => match self.scene.install_loaded(&mut self.surface, model) {
                Ok(normalized) => log::info!(
                    "Model loaded: scale {:.4}, camera distance {:.2}",
                    normalized.fit.scale,
                    normalized.camera_position.length()
                ),
                Err(err) => {
                    log::warn!("Model unusable ({err}), showing fallback");
                    self.scene.install_fallback(&mut self.surface);
                }
            },
            LoadOutcome::Failed(err) => {
                log::warn!("Model failed to load ({err}), showing fallback");
                self.scene.install_fallback(&mut self.surface);
            }
        }
        self.loading = false;
        true
    }

    // ── Frames ──

    /// Run one frame: idle spin unless dragging, then draw. Returns false
    /// once the loop is stopped, telling the caller not to reschedule.
    pub fn frame(&mut self) -> bool {
        if !self.scheduler.begin_frame() {
            return false;
        }
        if !self.drag.is_dragging() && !self.scene.slot().is_empty() {
            self.scene.transform.spin(self.idle_spin);
        }
        match self.surface.draw(&self.scene.frame_draw()) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => log::debug!("Surface reconfigured, frame skipped"),
            Err(err) => log::warn!("Frame skipped: {err}"),
        }
        true
    }

    pub fn stop_loop(&mut self) -> bool {
        self.scheduler.stop()
    }

    // ── Pointer ──

    pub fn pointer_down(&mut self, pos: PointerPos, bounds: &ViewportRect) -> bool {
        !self.disposed && self.drag.pointer_down(pos, bounds)
    }

    /// Returns whether the model rotated.
    pub fn pointer_move(&mut self, pos: PointerPos) -> bool {
        let Some((dx, dy)) = self.drag.pointer_move(pos) else {
            return false;
        };
        if self.scene.slot().is_empty() {
            return false;
        }
        self.scene
            .transform
            .apply_drag(dx as f32, dy as f32, self.drag_sensitivity);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag.pointer_up();
    }

    // ── Resize ──

    /// Apply a new host size. Returns the applied size, or `None` when
    /// nothing changed.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.disposed {
            return None;
        }
        let (width, height) = self.viewport.observe(width, height)?;
        self.scene.set_viewport(width, height);
        self.surface.resize(width, height);
        Some((width, height))
    }

    // ── Teardown ──

    /// Stop the loop, release the model, and dispose the surface. Only the
    /// first call does anything.
    pub fn teardown(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.scheduler.stop();
        self.drag.pointer_up();
        self.pending = None;
        self.scene.release(&mut self.surface);
        self.surface.dispose();
        self.disposed = true;
        log::info!(
            "Viewer torn down after {} frames",
            self.scheduler.frames_rendered()
        );
        true
    }
}
