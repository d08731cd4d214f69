//! Spray particles: fixed-capacity pool, ballistic update and crest spawning.
//!
//! The pool is never compacted. Dead particles (life ≤ 0) keep their slot
//! until the allocation counter wraps around to it again; the counter is
//! shared by every spawn cell and only ever increments.

use std::sync::atomic::{AtomicU32, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rustfft::num_complex::Complex32;

use super::field::sample_surface;
use super::hash::{hash3, pcg, unit};
use super::{smoothstep, GridSpec};
use crate::error::ConfigError;
use crate::params::{clamp_dt, SprayParams, CHOP_UNIT, HEIGHT_UNIT};

/// One spray particle, laid out as two `vec4<f32>` for the GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// xyz = position (camera-local meters), w = remaining life (seconds)
    pub pos_life: [f32; 4],
    /// xyz = velocity (m/s), w = random seed in [0, 1)
    pub vel_seed: [f32; 4],
}

impl Particle {
    pub fn life(&self) -> f32 {
        self.pos_life[3]
    }

    pub fn is_alive(&self) -> bool {
        self.life() > 0.0
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.pos_life[0], self.pos_life[1], self.pos_life[2])
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::new(self.vel_seed[0], self.vel_seed[1], self.vel_seed[2])
    }
}

/// Fixed-capacity particle storage plus the atomic allocation counter
#[derive(Debug)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    counter: AtomicU32,
}

impl ParticlePool {
    /// Zeroed pool; every slot starts dead
    pub fn new(capacity: u32) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::EmptyParticlePool);
        }
        Ok(Self {
            particles: vec![Particle::zeroed(); capacity as usize],
            counter: AtomicU32::new(0),
        })
    }

    pub fn capacity(&self) -> u32 {
        self.particles.len() as u32
    }

    /// Total claims so far (wrapping)
    pub fn counter(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Claim the next slot, wrapping modulo capacity
    pub fn claim(&self) -> usize {
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        (ticket % self.capacity()) as usize
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn alive_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_alive()).count()
    }
}

/// Per-frame inputs of the update pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStep {
    pub dt_s: f32,
    pub drag_per_s: f32,
    pub gravity_m_per_s2: f32,
    /// World origin shift applied this frame (meters, XZ)
    pub origin_shift: Vec2,
}

impl UpdateStep {
    pub fn new(dt_s: f32, params: &SprayParams, origin_shift: Vec2) -> Self {
        Self {
            dt_s,
            drag_per_s: params.drag_per_s,
            gravity_m_per_s2: params.gravity_m_per_s2,
            origin_shift,
        }
    }
}

/// Age and integrate every live particle; dead slots are left untouched
pub fn update_particles(particles: &mut [Particle], step: &UpdateStep) {
    let dt = clamp_dt(step.dt_s);
    let gravity = Vec3::new(0.0, step.gravity_m_per_s2, 0.0);
    let shift = Vec3::new(step.origin_shift.x, 0.0, step.origin_shift.y);

    for particle in particles.iter_mut().filter(|p| p.is_alive()) {
        let life = (particle.life() - dt).max(0.0);
        let mut velocity = particle.velocity();
        velocity += (gravity - step.drag_per_s * velocity) * dt;
        let position = particle.position() + velocity * dt - shift;

        particle.pos_life = [position.x, position.y, position.z, life];
        particle.vel_seed = [velocity.x, velocity.y, velocity.z, particle.vel_seed[3]];
    }
}

/// Per-frame inputs of the spawn pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnStep {
    pub dt_s: f32,
    /// Frame counter, decorrelates jitter and spawn draws between frames
    pub frame: u32,
    /// Camera position in local (recentred) XZ meters
    pub camera_xz: Vec2,
    pub patch_size_m: f32,
    pub height_scale: f32,
    pub choppiness: f32,
    pub params: SprayParams,
}

/// Test every candidate cell around the camera and spawn into claimed slots.
/// Returns the number of particles spawned.
pub fn spawn_particles(
    grid: &GridSpec,
    displacement: &[Complex32],
    pool: &mut ParticlePool,
    step: &SpawnStep,
) -> u32 {
    let p = &step.params;
    let dt = clamp_dt(step.dt_s);
    let n = grid.n() as f32;
    let spacing_m = step.patch_size_m / n;
    let chop = step.choppiness * CHOP_UNIT;
    let area_m = p.spawn_area_patches * step.patch_size_m;
    let cell_m = area_m / p.spawn_grid as f32;
    let corner = step.camera_xz - Vec2::splat(area_m * 0.5);
    let wind = Vec2::from_array(p.wind_dir).normalize_or(Vec2::X);
    let mut spawned = 0;

    for cy in 0..p.spawn_grid {
        for cx in 0..p.spawn_grid {
            let mut h = hash3(cx, cy, step.frame);
            let mut draw = || {
                h = pcg(h);
                unit(h)
            };

            let jitter = Vec2::new(draw(), draw());
            let cell_xz = corner + (Vec2::new(cx as f32, cy as f32) + jitter) * cell_m;
            let texel = cell_xz / spacing_m;
            let surface = sample_surface(grid, displacement, texel.x, texel.y, spacing_m, chop);

            let weight = smoothstep(p.slope0, p.slope1, surface.slope()).max(smoothstep(p.fold0, p.fold1, surface.fold));
            let chance = (p.spawn_rate * dt * weight).clamp(0.0, 1.0);
            if draw() >= chance {
                continue;
            }

            let slot = pool.claim();
            let origin = cell_xz + surface.displacement * chop;
            let height = surface.height * step.height_scale * HEIGHT_UNIT;

            let outward = (wind + surface.downslope()).normalize_or(wind);
            let side = p.v_side_m_per_s * (0.5 + 0.5 * draw());
            let up = p.v_up_m_per_s * (0.6 + 0.4 * draw());
            let life = p.base_life_s * (0.75 + 0.5 * draw());
            let seed = draw();

            pool.particles_mut()[slot] = Particle {
                pos_life: [origin.x, height, origin.y, life],
                vel_seed: [outward.x * side, up, outward.y * side, seed],
            };
            spawned += 1;
        }
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::complex_zeros;

    fn always_spawn() -> SprayParams {
        // Any slope saturates the ramp and the rate test always passes
        SprayParams {
            slope0: -1.0,
            slope1: 0.0,
            spawn_rate: 1.0e4,
            spawn_grid: 4,
            ..Default::default()
        }
    }

    fn spawn_step(params: SprayParams, frame: u32) -> SpawnStep {
        SpawnStep {
            dt_s: 1.0 / 60.0,
            frame,
            camera_xz: Vec2::new(100.0, 100.0),
            patch_size_m: 512.0,
            height_scale: 100.0,
            choppiness: 6.0,
            params,
        }
    }

    #[test]
    fn test_rejects_empty_pool() {
        assert_eq!(ParticlePool::new(0).unwrap_err(), ConfigError::EmptyParticlePool);
    }

    #[test]
    fn test_particle_layout_is_two_vec4() {
        assert_eq!(std::mem::size_of::<Particle>(), 32);
    }

    #[test]
    fn test_counter_wraps_modulo_capacity() {
        let pool = ParticlePool::new(3).unwrap();
        let slots: Vec<usize> = (0..7).map(|_| pool.claim()).collect();
        assert_eq!(slots, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(pool.counter(), 7);
    }

    #[test]
    fn test_oversubscribed_spawn_stays_in_bounds() {
        let grid = GridSpec::new(16).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let mut pool = ParticlePool::new(4).unwrap();

        let spawned = spawn_particles(&grid, &field, &mut pool, &spawn_step(always_spawn(), 0));
        assert_eq!(spawned, 16);
        assert_eq!(pool.counter(), 16);
        assert_eq!(pool.particles().len(), 4);
        assert_eq!(pool.alive_count(), 4);
        // 16 claims on 4 slots: the next claim starts over at slot 0
        assert_eq!(pool.claim(), 0);
    }

    #[test]
    fn test_flat_sea_spawns_nothing() {
        let grid = GridSpec::new(16).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let mut pool = ParticlePool::new(64).unwrap();
        let params = SprayParams {
            spawn_grid: 8,
            ..Default::default()
        };
        assert_eq!(spawn_particles(&grid, &field, &mut pool, &spawn_step(params, 3)), 0);
        assert_eq!(pool.counter(), 0);
    }

    #[test]
    fn test_spawned_particles_launch_upward() {
        let grid = GridSpec::new(16).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let mut pool = ParticlePool::new(16).unwrap();
        spawn_particles(&grid, &field, &mut pool, &spawn_step(always_spawn(), 1));

        let base_life = SprayParams::default().base_life_s;
        for particle in pool.particles() {
            assert!(particle.velocity().y > 0.0);
            assert!(particle.life() >= 0.75 * base_life && particle.life() <= 1.25 * base_life);
            assert!((0.0..1.0).contains(&particle.vel_seed[3]));
        }
    }

    #[test]
    fn test_update_integrates_live_particles() {
        let mut particles = vec![Particle {
            pos_life: [0.0, 0.0, 0.0, 1.0],
            vel_seed: [1.0, 10.0, 0.0, 0.5],
        }];
        let step = UpdateStep::new(0.01, &SprayParams::default(), Vec2::ZERO);
        update_particles(&mut particles, &step);

        let p = particles[0];
        assert!((p.life() - 0.99).abs() < 1e-6);
        // v += (g - drag·v)·dt
        let expected_vy = 10.0 + (-9.8 - 1.5 * 10.0) * 0.01;
        assert!((p.velocity().y - expected_vy).abs() < 1e-5);
        assert!((p.position().y - expected_vy * 0.01).abs() < 1e-6);
        assert_eq!(p.vel_seed[3], 0.5);
    }

    #[test]
    fn test_expired_particle_is_clamped_dead() {
        let mut particles = vec![Particle {
            pos_life: [0.0, 0.0, 0.0, 0.01],
            vel_seed: [0.0; 4],
        }];
        let step = UpdateStep::new(0.05, &SprayParams::default(), Vec2::ZERO);
        update_particles(&mut particles, &step);
        assert_eq!(particles[0].life(), 0.0);
        assert!(!particles[0].is_alive());
    }

    #[test]
    fn test_dead_particle_is_skipped_then_respawned() {
        let grid = GridSpec::new(16).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let mut pool = ParticlePool::new(1).unwrap();
        let dead = Particle {
            pos_life: [1.0, 2.0, 3.0, 0.0],
            vel_seed: [4.0, 5.0, 6.0, 0.25],
        };
        pool.particles_mut()[0] = dead;

        let step = UpdateStep::new(0.016, &SprayParams::default(), Vec2::new(512.0, 0.0));
        update_particles(pool.particles_mut(), &step);
        assert_eq!(pool.particles()[0], dead);

        let params = SprayParams {
            spawn_grid: 1,
            ..always_spawn()
        };
        spawn_particles(&grid, &field, &mut pool, &spawn_step(params, 2));
        assert!(pool.particles()[0].is_alive());
    }

    #[test]
    fn test_origin_shift_moves_live_particles() {
        let mut particles = vec![Particle {
            pos_life: [600.0, 1.0, 10.0, 1.0],
            vel_seed: [0.0; 4],
        }];
        let mut step = UpdateStep::new(0.0, &SprayParams::default(), Vec2::new(512.0, 0.0));
        step.gravity_m_per_s2 = 0.0;
        update_particles(&mut particles, &step);
        assert_eq!(particles[0].position(), Vec3::new(88.0, 1.0, 10.0));
    }
}
