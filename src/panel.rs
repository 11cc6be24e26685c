use log::debug;

use crate::math::to_precision_15;
use crate::scene::{Scene, SceneHandles};

/// Width of the slider bar in terminal columns
pub const BAR_WIDTH: u16 = 20;
const LABEL_WIDTH: u16 = 10;
const VALUE_WIDTH: u16 = 9;
/// Total panel width in terminal columns
pub const PANEL_WIDTH: u16 = LABEL_WIDTH + BAR_WIDTH + VALUE_WIDTH + 2;

type ReadFn = Box<dyn Fn(&Scene) -> f64>;
type ApplyFn = Box<dyn Fn(&mut Scene, f64)>;

/// A numeric control bound to one scene field through a getter and a setter
pub struct Slider {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    read: ReadFn,
    apply: ApplyFn,
}

impl Slider {
    pub fn new(
        key: &'static str,
        label: &'static str,
        (min, max, step): (f64, f64, f64),
        read: impl Fn(&Scene) -> f64 + 'static,
        apply: impl Fn(&mut Scene, f64) + 'static,
    ) -> Self {
        Slider {
            key,
            label,
            min,
            max,
            step,
            read: Box::new(read),
            apply: Box::new(apply),
        }
    }

    /// Rounds to the nearest step counted from `min`, then clamps into range
    pub fn snap(&self, value: f64) -> f64 {
        let snapped = if self.step > 0.0 {
            ((value - self.min) / self.step).round() * self.step + self.min
        } else {
            value
        };
        to_precision_15(snapped.clamp(self.min, self.max))
    }

    pub fn value(&self, scene: &Scene) -> f64 {
        (self.read)(scene)
    }

    /// Writes a snapped value into the bound field and returns it
    pub fn set(&self, scene: &mut Scene, value: f64) -> f64 {
        let value = self.snap(value);
        (self.apply)(scene, value);
        debug!("{} = {value}", self.key);
        value
    }

    /// Position of the current value in [0, 1]
    pub fn fraction(&self, scene: &Scene) -> f64 {
        if self.max > self.min {
            ((self.value(scene) - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Where the panel sits on screen, in terminal cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelLayout {
    pub left: u16,
    pub top: u16,
    pub width: u16,
}

impl PanelLayout {
    /// Top-right corner of a terminal `cols` wide
    pub fn for_terminal(cols: u16) -> Self {
        PanelLayout {
            left: cols.saturating_sub(PANEL_WIDTH),
            top: 0,
            width: PANEL_WIDTH.min(cols),
        }
    }

    fn bar_left(&self) -> u16 {
        self.left + 1 + LABEL_WIDTH
    }
}

/// Live tweak panel over the scene's lights and ball material
pub struct DebugPanel {
    sliders: Vec<Slider>,
    selected: usize,
    pub visible: bool,
}

impl DebugPanel {
    pub fn new(sliders: Vec<Slider>) -> Self {
        DebugPanel {
            sliders,
            selected: 0,
            visible: true,
        }
    }

    /// The court scene's controls
    pub fn for_scene(handles: &SceneHandles) -> Self {
        let SceneHandles {
            ambient,
            directional,
            sphere,
            ..
        } = *handles;
        let intensity = (0.0, 3.0, 0.001);
        let position = (-5.0, 5.0, 0.001);
        let unit = (0.0, 1.0, 0.001);

        let light_axis = move |scene: &Scene, axis: usize| {
            scene
                .light(directional)
                .position()
                .map_or(0.0, |p| p[axis])
        };
        let set_light_axis = move |scene: &mut Scene, axis: usize, value: f64| {
            if let Some(position) = scene.light_mut(directional).position_mut() {
                position[axis] = value;
            }
        };

        DebugPanel::new(vec![
            Slider::new(
                "ambient.intensity",
                "ambient",
                intensity,
                move |scene| scene.light(ambient).intensity(),
                move |scene, v| *scene.light_mut(ambient).intensity_mut() = v,
            ),
            Slider::new(
                "directional.intensity",
                "sun",
                intensity,
                move |scene| scene.light(directional).intensity(),
                move |scene, v| *scene.light_mut(directional).intensity_mut() = v,
            ),
            Slider::new(
                "directional.position.x",
                "sun x",
                position,
                move |scene| light_axis(scene, 0),
                move |scene, v| set_light_axis(scene, 0, v),
            ),
            Slider::new(
                "directional.position.y",
                "sun y",
                position,
                move |scene| light_axis(scene, 1),
                move |scene, v| set_light_axis(scene, 1, v),
            ),
            Slider::new(
                "directional.position.z",
                "sun z",
                position,
                move |scene| light_axis(scene, 2),
                move |scene, v| set_light_axis(scene, 2, v),
            ),
            Slider::new(
                "material.metalness",
                "metalness",
                unit,
                move |scene| {
                    scene
                        .mesh(sphere)
                        .material
                        .standard()
                        .map_or(0.0, |m| m.metalness)
                },
                move |scene, v| {
                    if let Some(m) = scene.mesh_mut(sphere).material.standard_mut() {
                        m.metalness = v;
                    }
                },
            ),
            Slider::new(
                "material.roughness",
                "roughness",
                unit,
                move |scene| {
                    scene
                        .mesh(sphere)
                        .material
                        .standard()
                        .map_or(0.0, |m| m.roughness)
                },
                move |scene, v| {
                    if let Some(m) = scene.mesh_mut(sphere).material.standard_mut() {
                        m.roughness = v;
                    }
                },
            ),
        ])
    }

    pub fn select_next(&mut self) {
        if !self.sliders.is_empty() {
            self.selected = (self.selected + 1) % self.sliders.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.sliders.is_empty() {
            self.selected = (self.selected + self.sliders.len() - 1) % self.sliders.len();
        }
    }

    /// Moves the selected slider by a number of steps
    pub fn nudge(&self, scene: &mut Scene, steps: f64) {
        if let Some(slider) = self.sliders.get(self.selected) {
            let value = slider.value(scene) + steps * slider.step;
            slider.set(scene, value);
        }
    }

    /// Jumps the selected slider to its minimum or maximum
    pub fn jump(&self, scene: &mut Scene, to_max: bool) {
        if let Some(slider) = self.sliders.get(self.selected) {
            slider.set(scene, if to_max { slider.max } else { slider.min });
        }
    }

    /// Handles a click or drag at a terminal cell.
    ///
    /// Returns true if the cell belongs to the panel, in which case the input must not
    /// reach the camera controls.
    pub fn pointer(
        &mut self,
        scene: &mut Scene,
        layout: &PanelLayout,
        column: u16,
        row: u16,
    ) -> bool {
        if !self.contains(layout, column, row) {
            return false;
        }
        let Some(index) = (row - layout.top).checked_sub(1).map(usize::from) else {
            // Title row
            return true;
        };
        let bar_left = layout.bar_left();
        if let Some(slider) = self.sliders.get(index) {
            self.selected = index;
            if column >= bar_left && column < bar_left + BAR_WIDTH {
                let fraction = (column - bar_left) as f64 / (BAR_WIDTH - 1) as f64;
                slider.set(scene, slider.min + fraction * (slider.max - slider.min));
            }
        }
        true
    }

    /// Whether a terminal cell is covered by the panel
    pub fn contains(&self, layout: &PanelLayout, column: u16, row: u16) -> bool {
        self.visible
            && column >= layout.left
            && column < layout.left + layout.width
            && row >= layout.top
            && row <= layout.top + self.sliders.len() as u16
    }

    /// Text rows of the panel: a title followed by one row per slider
    pub fn lines(&self, scene: &Scene, fps: f64) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.sliders.len() + 1);
        let title = format!(
            "{} {}  {:.1} fps",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            fps
        );
        lines.push(format!(" {:<width$}", title, width = (PANEL_WIDTH - 1) as usize));

        for (i, slider) in self.sliders.iter().enumerate() {
            let filled = (slider.fraction(scene) * BAR_WIDTH as f64).round() as usize;
            let bar: String = (0..BAR_WIDTH as usize)
                .map(|c| if c < filled { '█' } else { '░' })
                .collect();
            let marker = if i == self.selected { '>' } else { ' ' };
            lines.push(format!(
                "{marker}{:<label$}{bar}{:>value$.3} ",
                slider.label,
                slider.value(scene),
                label = LABEL_WIDTH as usize,
                value = VALUE_WIDTH as usize,
            ));
        }
        lines
    }
}

#[cfg(test)]
impl DebugPanel {
    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    pub fn slider(&self, key: &str) -> Option<&Slider> {
        self.sliders.iter().find(|s| s.key == key)
    }

    /// Sets a slider by key. Returns the value actually written.
    pub fn set(&self, scene: &mut Scene, key: &str, value: f64) -> Option<f64> {
        self.slider(key).map(|slider| slider.set(scene, value))
    }

    pub fn selected(&self) -> usize {
        self.selected
    }
}
