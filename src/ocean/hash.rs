//! Stateless integer hashing shared with `shaders/common.wgsl`.
//!
//! Every random draw in the simulation is a pure function of texel
//! coordinates, a seed and (for spray) the frame counter, so the GPU and
//! the CPU reference produce the same streams.

use std::f32::consts::TAU;

/// PCG-RXS-M-XS 32-bit hash
pub fn pcg(v: u32) -> u32 {
    let state = v.wrapping_mul(747796405).wrapping_add(2891336453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);
    (word >> 22) ^ word
}

/// Hash of a 2D coordinate under a seed
pub fn hash3(x: u32, y: u32, seed: u32) -> u32 {
    pcg(x.wrapping_add(pcg(y.wrapping_add(pcg(seed)))))
}

/// Uniform float in [0, 1) from the top 24 bits
pub fn unit(h: u32) -> f32 {
    (h >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Two independent standard normal samples for texel (x, y)
pub fn gaussian_pair(x: u32, y: u32, seed: u32) -> (f32, f32) {
    let h1 = hash3(x, y, seed);
    let h2 = pcg(h1);
    // (0, 1] keeps ln finite
    let u1 = ((h1 >> 8) as f32 + 1.0) * (1.0 / 16_777_216.0);
    let u2 = unit(h2);
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = TAU * u2;
    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_range() {
        for v in [0u32, 1, 12345, u32::MAX] {
            let u = unit(pcg(v));
            assert!((0.0..1.0).contains(&u));
        }
        assert!(unit(u32::MAX) < 1.0);
    }

    #[test]
    fn test_gaussian_pair_is_finite_and_roughly_normal() {
        let mut sum = 0.0_f64;
        let mut sum_sq = 0.0_f64;
        let count = 64 * 64;
        for y in 0..64 {
            for x in 0..64 {
                let (a, b) = gaussian_pair(x, y, 7);
                assert!(a.is_finite() && b.is_finite());
                sum += a as f64;
                sum_sq += (a as f64) * (a as f64);
            }
        }
        let mean = sum / count as f64;
        let var = sum_sq / count as f64 - mean * mean;
        assert!(mean.abs() < 0.1, "mean {}", mean);
        assert!((var - 1.0).abs() < 0.15, "variance {}", var);
    }

    #[test]
    fn test_seed_changes_stream() {
        assert_ne!(hash3(3, 4, 1337), hash3(3, 4, 424242));
        assert_eq!(hash3(3, 4, 1337), hash3(3, 4, 1337));
    }
}
