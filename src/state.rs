use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use glam::DVec2;
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

use crate::animation::MotionState;
use crate::camera::{PerspectiveCamera, FAR, FOV_DEGREES, NEAR, START_POSITION};
use crate::clock::Clock;
use crate::controls::{DragMode, OrbitControls};
use crate::panel::{DebugPanel, PanelLayout};
use crate::renderer::Renderer;
use crate::scene::{build_scene, Scene, SceneHandles, SceneTextures};
use crate::texture::TextureLoader;
use crate::viewport::{clamp_pixel_ratio, handle_resize, Sizes};

/// What the frame loop should do after an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Frames-per-second estimate for the panel header.
///
/// Frames are counted in windows of at least one second; `fps` keeps the rate of the last
/// finished window so the readout does not flicker every frame.
pub struct FrameCounter {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl FrameCounter {
    pub fn new() -> Self {
        FrameCounter {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    pub fn frame(&mut self) {
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the frame loop and event handlers share
pub struct AppContext {
    pub scene: Scene,
    pub handles: SceneHandles,
    pub loader: TextureLoader,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub renderer: Renderer,
    pub sizes: Sizes,
    pub clock: Clock,
    pub panel: DebugPanel,
    pub frames: FrameCounter,
    /// Requested supersampling factor before clamping
    pub device_pixel_ratio: f64,
    /// A panel slider is being dragged
    panel_drag: bool,
}

impl AppContext {
    /// Loads textures from `root`, builds the scene and sets up camera, controls and renderer
    pub fn new(root: &Path, sizes: Sizes, device_pixel_ratio: f64) -> Self {
        let mut loader = TextureLoader::new(root);
        let textures = SceneTextures::load(&mut loader);
        let (scene, handles) = build_scene(&textures);

        // Base camera
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, sizes.aspect(), NEAR, FAR);
        camera.position = START_POSITION;

        // Controls
        let mut controls = OrbitControls::new();
        controls.enable_damping = true;
        camera.look_at(controls.target);

        // Renderer
        let mut renderer = Renderer::new(sizes.width, sizes.height);
        renderer.set_pixel_ratio(clamp_pixel_ratio(device_pixel_ratio));

        let panel = DebugPanel::for_scene(&handles);

        for mesh in scene.meshes() {
            debug!("mesh {}: {} triangles", mesh.name, mesh.geometry.triangle_count());
        }
        info!(
            "scene ready: {} meshes, {} lights, viewport {}x{}, textures from {}",
            scene.meshes().len(),
            scene.lights().len(),
            sizes.width,
            sizes.height,
            loader.root().display()
        );

        AppContext {
            scene,
            handles,
            loader,
            camera,
            controls,
            renderer,
            sizes,
            clock: Clock::new(),
            panel,
            frames: FrameCounter::new(),
            device_pixel_ratio,
            panel_drag: false,
        }
    }

    /// Applies a new viewport size in pixels
    pub fn resize(&mut self, width: f64, height: f64) {
        handle_resize(
            &mut self.sizes,
            width,
            height,
            self.device_pixel_ratio,
            &mut self.camera,
            &mut self.renderer,
        );
        debug!(
            "resize to {width}x{height} at pixel ratio {}",
            self.renderer.pixel_ratio()
        );
    }

    /// One frame at the clock's current time
    pub fn tick(&mut self) -> MotionState {
        let elapsed = self.clock.elapsed_time();
        self.tick_at(elapsed)
    }

    /// One frame at `elapsed` seconds: animate, advance controls, render
    pub fn tick_at(&mut self, elapsed: f64) -> MotionState {
        if self.loader.poll() > 0 {
            debug!("textures installed, {} still loading", self.loader.pending());
        }

        let motion = MotionState::capture(&self.scene, &self.handles).advance(elapsed);
        motion.apply(&mut self.scene, &self.handles);

        // Update controls
        self.controls.update(&mut self.camera);

        // Render
        self.renderer.render(&self.scene, &self.camera);
        self.frames.frame();
        motion
    }

    /// Terminal columns the viewport spans
    pub fn columns(&self) -> u16 {
        self.sizes.width.round().clamp(0.0, u16::MAX as f64) as u16
    }

    pub fn panel_layout(&self) -> PanelLayout {
        PanelLayout::for_terminal(self.columns())
    }

    pub fn handle_event(&mut self, event: Event) -> Flow {
        match event {
            Event::Resize(cols, rows) => {
                let sizes = Sizes::from_terminal(cols, rows);
                self.resize(sizes.width, sizes.height);
                Flow::Continue
            }
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        let coarse = if key.modifiers.contains(KeyModifiers::SHIFT) {
            10.0
        } else {
            1.0
        };

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('h') | KeyCode::Char('H') => self.panel.visible = !self.panel.visible,
            KeyCode::Up | KeyCode::BackTab => self.panel.select_previous(),
            KeyCode::Down | KeyCode::Tab => self.panel.select_next(),
            KeyCode::Left => self.panel.nudge(&mut self.scene, -coarse),
            KeyCode::Right => self.panel.nudge(&mut self.scene, coarse),
            KeyCode::PageDown => self.panel.nudge(&mut self.scene, -100.0),
            KeyCode::PageUp => self.panel.nudge(&mut self.scene, 100.0),
            KeyCode::Home => self.panel.jump(&mut self.scene, false),
            KeyCode::End => self.panel.jump(&mut self.scene, true),
            _ => {}
        }
        Flow::Continue
    }

    /// Presses and wheel turns over the panel belong to the panel, never to the camera
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let layout = self.panel_layout();
        let over_panel = self.panel.contains(&layout, mouse.column, mouse.row);
        // Pointer position in pixels, at the center of the cell
        let at = DVec2::new(mouse.column as f64 + 0.5, mouse.row as f64 * 2.0 + 1.0);

        match mouse.kind {
            MouseEventKind::Down(button) if over_panel => {
                if button == MouseButton::Left {
                    self.panel
                        .pointer(&mut self.scene, &layout, mouse.column, mouse.row);
                    self.panel_drag = true;
                }
            }
            MouseEventKind::Down(button) => {
                let mode = match button {
                    MouseButton::Left => DragMode::Rotate,
                    MouseButton::Right | MouseButton::Middle => DragMode::Pan,
                };
                self.controls.begin_drag(mode, at);
            }
            MouseEventKind::Drag(_) => {
                if self.panel_drag {
                    self.panel
                        .pointer(&mut self.scene, &layout, mouse.column, mouse.row);
                } else if self.controls.is_dragging() {
                    self.controls.drag_to(at, self.sizes.height, &self.camera);
                }
            }
            MouseEventKind::Up(_) => {
                self.panel_drag = false;
                self.controls.end_drag();
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown if over_panel => {}
            MouseEventKind::ScrollUp => self.controls.wheel(-1.0),
            MouseEventKind::ScrollDown => self.controls.wheel(1.0),
            _ => {}
        }
    }
}
