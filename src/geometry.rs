use glam::{DVec2, DVec3};
use std::f64::consts::PI;

/// Indexed triangle mesh data in object space
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub positions: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub uvs: Vec<DVec2>,
    /// Counter-clockwise triangles
    pub indices: Vec<[usize; 3]>,
}

impl Geometry {
    /// UV sphere centered on the origin.
    ///
    /// `u` runs around the equator, `v` from the south pole (0) to the north pole (1).
    /// The pole rows emit a single triangle per segment.
    pub fn sphere(radius: f64, width_segments: usize, height_segments: usize) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut geometry = Geometry::default();
        let mut grid = Vec::with_capacity(height_segments + 1);

        for iy in 0..=height_segments {
            let v = iy as f64 / height_segments as f64;
            let mut row = Vec::with_capacity(width_segments + 1);

            for ix in 0..=width_segments {
                let u = ix as f64 / width_segments as f64;
                let (sin_theta, cos_theta) = (v * PI).sin_cos();
                let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
                let position = DVec3::new(
                    -radius * cos_phi * sin_theta,
                    radius * cos_theta,
                    radius * sin_phi * sin_theta,
                );

                row.push(geometry.positions.len());
                geometry.positions.push(position);
                geometry.normals.push(position.normalize_or_zero());
                geometry.uvs.push(DVec2::new(u, 1.0 - v));
            }
            grid.push(row);
        }

        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    geometry.indices.push([a, b, d]);
                }
                if iy != height_segments - 1 {
                    geometry.indices.push([b, c, d]);
                }
            }
        }

        geometry
    }

    /// Single quad in the XY plane facing +Z
    pub fn plane(width: f64, height: f64) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Geometry {
            positions: vec![
                DVec3::new(-hw, hh, 0.0),
                DVec3::new(hw, hh, 0.0),
                DVec3::new(-hw, -hh, 0.0),
                DVec3::new(hw, -hh, 0.0),
            ],
            normals: vec![DVec3::Z; 4],
            uvs: vec![
                DVec2::new(0.0, 1.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
            ],
            indices: vec![[0, 2, 1], [2, 3, 1]],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}
