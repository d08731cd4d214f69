//! Periodic sampling of the packed displacement field.
//!
//! Shared by foam and spray so both derive slope and fold the same way the
//! `surface_at` helper in `shaders/surface.wgsl` does.

use glam::Vec2;
use rustfft::num_complex::Complex32;

use super::GridSpec;

/// Bilinear fetch at continuous texel coordinates, wrapping on both axes
pub(crate) fn bilinear(grid: &GridSpec, u: f32, v: f32, fetch: impl Fn(usize, usize) -> f32) -> f32 {
    let n = grid.n() as i64;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let at = |x: i64, y: i64| fetch(x.rem_euclid(n) as usize, y.rem_euclid(n) as usize);
    let top = at(x0, y0) * (1.0 - fx) + at(x0 + 1, y0) * fx;
    let bottom = at(x0, y0 + 1) * (1.0 - fx) + at(x0 + 1, y0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Local surface properties derived from the displacement field
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SurfaceSample {
    /// Field height (field units)
    pub height: f32,
    /// Horizontal displacement (dx, dz) in field units
    pub displacement: Vec2,
    /// Height gradient per meter
    pub gradient: Vec2,
    /// 1 - Jacobian of the choppy horizontal map; > 0 where the surface folds
    pub fold: f32,
}

impl SurfaceSample {
    pub fn slope(&self) -> f32 {
        self.gradient.length()
    }

    pub fn downslope(&self) -> Vec2 {
        (-self.gradient).normalize_or_zero()
    }
}

/// Sample height, displacement, gradient and fold at texel coordinates (u, v).
///
/// Derivatives are central differences one texel apart, `spacing_m` meters.
/// `chop` is the horizontal displacement scale applied to dx/dz.
pub(crate) fn sample_surface(
    grid: &GridSpec,
    field: &[Complex32],
    u: f32,
    v: f32,
    spacing_m: f32,
    chop: f32,
) -> SurfaceSample {
    let block = |b: usize| move |x: usize, y: usize| field[grid.packed_index(b, x, y)].re;
    let h = |u: f32, v: f32| bilinear(grid, u, v, block(0));
    let dx = |u: f32, v: f32| bilinear(grid, u, v, block(1));
    let dz = |u: f32, v: f32| bilinear(grid, u, v, block(2));
    let inv = 1.0 / (2.0 * spacing_m);

    let gradient = Vec2::new(
        (h(u + 1.0, v) - h(u - 1.0, v)) * inv,
        (h(u, v + 1.0) - h(u, v - 1.0)) * inv,
    );

    let ddx_dx = (dx(u + 1.0, v) - dx(u - 1.0, v)) * inv;
    let ddx_dz = (dx(u, v + 1.0) - dx(u, v - 1.0)) * inv;
    let ddz_dx = (dz(u + 1.0, v) - dz(u - 1.0, v)) * inv;
    let ddz_dz = (dz(u, v + 1.0) - dz(u, v - 1.0)) * inv;
    let jacobian = (1.0 + chop * ddx_dx) * (1.0 + chop * ddz_dz) - chop * chop * ddx_dz * ddz_dx;

    SurfaceSample {
        height: h(u, v),
        displacement: Vec2::new(dx(u, v), dz(u, v)),
        gradient,
        fold: 1.0 - jacobian,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::complex_zeros;

    #[test]
    fn test_bilinear_wraps_and_interpolates() {
        let grid = GridSpec::new(4).unwrap();
        let values: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let fetch = |x: usize, y: usize| values[y * 4 + x];
        assert_eq!(bilinear(&grid, 1.0, 2.0, fetch), 9.0);
        assert_eq!(bilinear(&grid, 1.5, 0.0, fetch), 1.5);
        // x = -1 wraps to 3
        assert_eq!(bilinear(&grid, -1.0, 0.0, fetch), 3.0);
    }

    #[test]
    fn test_flat_field_has_no_slope_or_fold() {
        let grid = GridSpec::new(8).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let s = sample_surface(&grid, &field, 2.5, 3.25, 1.0, 0.6);
        assert_eq!(s.slope(), 0.0);
        assert_eq!(s.fold, 0.0);
        assert_eq!(s.downslope(), Vec2::ZERO);
    }

    #[test]
    fn test_ramp_gradient_points_uphill() {
        let grid = GridSpec::new(8).unwrap();
        let mut field = complex_zeros(grid.packed_texels());
        // Height rises along +x away from the wrap seam
        for y in 0..8 {
            for x in 0..8 {
                field[grid.packed_index(0, x, y)] = Complex32::new(x as f32, 0.0);
            }
        }
        let s = sample_surface(&grid, &field, 3.0, 4.0, 2.0, 0.0);
        assert!((s.gradient.x - 0.5).abs() < 1e-6);
        assert_eq!(s.gradient.y, 0.0);
        assert_eq!(s.downslope(), Vec2::new(-1.0, 0.0));
    }
}
