use glam::{DVec2, DVec4};
use image::RgbaImage;
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::OnceLock;
use std::thread;

use crate::math::srgb_to_linear;

/// How the color channels of a texture are encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Linear,
    Srgb,
}

struct TextureSlot {
    /// Decoded pixels, `None` until the load finishes (or forever if it failed)
    image: Option<RgbaImage>,
    color_space: ColorSpace,
    source: Option<PathBuf>,
}

/// Shared handle to a texture image.
///
/// Clones point at the same slot, so a load that finishes later becomes visible to
/// every material holding the handle.
#[derive(Clone)]
pub struct Texture(Rc<RefCell<TextureSlot>>);

impl Texture {
    fn with_slot(image: Option<RgbaImage>, source: Option<PathBuf>) -> Self {
        Texture(Rc::new(RefCell::new(TextureSlot {
            image,
            color_space: ColorSpace::Linear,
            source,
        })))
    }

    pub fn set_color_space(&self, color_space: ColorSpace) {
        self.0.borrow_mut().color_space = color_space;
    }

    /// Path the texture was requested from, if any
    pub fn source(&self) -> Option<PathBuf> {
        self.0.borrow().source.clone()
    }

    fn install(&self, image: RgbaImage) {
        self.0.borrow_mut().image = Some(image);
    }

    /// Bilinear sample with clamp-to-edge wrapping. Returns linear RGBA.
    ///
    /// `v` grows upwards, so `(0, 0)` is the bottom-left corner of the image.
    pub fn sample(&self, uv: DVec2) -> DVec4 {
        let slot = self.0.borrow();
        let image = match &slot.image {
            Some(image) if image.width() > 0 && image.height() > 0 => image,
            _ => return DVec4::new(0.0, 0.0, 0.0, 1.0),
        };

        let (width, height) = (image.width() as i64, image.height() as i64);
        let x = uv.x.clamp(0.0, 1.0) * width as f64 - 0.5;
        let y = (1.0 - uv.y.clamp(0.0, 1.0)) * height as f64 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);

        let texel = |tx: i64, ty: i64| -> DVec4 {
            let px = image.get_pixel(
                tx.clamp(0, width - 1) as u32,
                ty.clamp(0, height - 1) as u32,
            );
            decode_texel(px.0, slot.color_space)
        };

        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = texel(x0, y0).lerp(texel(x0 + 1, y0), fx);
        let bottom = texel(x0, y0 + 1).lerp(texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}

#[cfg(test)]
impl Texture {
    /// A blank texture that samples as opaque black
    pub fn placeholder() -> Self {
        Self::with_slot(None, None)
    }

    /// A texture backed by an already decoded image
    pub fn from_image(image: RgbaImage) -> Self {
        Self::with_slot(Some(image), None)
    }

    pub fn color_space(&self) -> ColorSpace {
        self.0.borrow().color_space
    }

    /// Whether the image data has arrived
    pub fn is_loaded(&self) -> bool {
        self.0.borrow().image.is_some()
    }

    /// True when both handles share the same slot
    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn srgb_table() -> &'static [f64; 256] {
    static TABLE: OnceLock<[f64; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = srgb_to_linear(i as f64 / 255.0);
        }
        table
    })
}

fn decode_texel(rgba: [u8; 4], color_space: ColorSpace) -> DVec4 {
    let alpha = rgba[3] as f64 / 255.0;
    match color_space {
        ColorSpace::Linear => DVec4::new(
            rgba[0] as f64 / 255.0,
            rgba[1] as f64 / 255.0,
            rgba[2] as f64 / 255.0,
            alpha,
        ),
        ColorSpace::Srgb => {
            let table = srgb_table();
            DVec4::new(
                table[rgba[0] as usize],
                table[rgba[1] as usize],
                table[rgba[2] as usize],
                alpha,
            )
        }
    }
}

/// A decode finished on a worker thread
struct Decoded {
    id: usize,
    result: Result<RgbaImage, image::ImageError>,
}

/// Asynchronous texture loader with a per-path cache.
///
/// `load` hands back a placeholder right away. Decoding happens on a worker
/// thread and the image is installed into the shared handle by `poll`, which the
/// frame loop calls once per frame.
pub struct TextureLoader {
    root: PathBuf,
    cache: HashMap<PathBuf, Texture>,
    in_flight: HashMap<usize, Texture>,
    next_id: usize,
    sender: Sender<Decoded>,
    receiver: Receiver<Decoded>,
}

impl TextureLoader {
    /// Creates a loader resolving paths relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        TextureLoader {
            root: root.into(),
            cache: HashMap::new(),
            in_flight: HashMap::new(),
            next_id: 0,
            sender,
            receiver,
        }
    }

    /// Resolves a served path such as `/textures/a.png` against the root directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Starts loading `path`, or returns the cached handle if it was requested before
    pub fn load(&mut self, path: &str) -> Texture {
        let resolved = self.resolve(path);
        if let Some(texture) = self.cache.get(&resolved) {
            return texture.clone();
        }

        let texture = Texture::with_slot(None, Some(resolved.clone()));
        self.cache.insert(resolved.clone(), texture.clone());

        let id = self.next_id;
        self.next_id += 1;
        let sender = self.sender.clone();
        let worker_path = resolved.clone();
        let spawned = thread::Builder::new()
            .name(format!("texture-{id}"))
            .spawn(move || {
                let result = image::open(&worker_path).map(|image| image.into_rgba8());
                // The loader may already be gone during shutdown
                let _ = sender.send(Decoded { id, result });
            });

        match spawned {
            Ok(_) => {
                debug!("loading texture {}", resolved.display());
                self.in_flight.insert(id, texture.clone());
            }
            Err(err) => warn!("could not start loading {}: {err}", resolved.display()),
        }
        texture
    }

    /// Installs every decode that has finished. Returns how many textures changed.
    pub fn poll(&mut self) -> usize {
        let mut installed = 0;
        while let Ok(decoded) = self.receiver.try_recv() {
            let Some(texture) = self.in_flight.remove(&decoded.id) else {
                continue;
            };
            let path = texture.source().unwrap_or_default();
            match decoded.result {
                Ok(image) => {
                    debug!(
                        "texture {} ready ({}x{})",
                        path.display(),
                        image.width(),
                        image.height()
                    );
                    texture.install(image);
                    installed += 1;
                }
                Err(err) => warn!("failed to load texture {}: {err}", path.display()),
            }
        }
        installed
    }

    /// Number of loads still running
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
