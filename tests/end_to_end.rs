//! Full-size CPU scenario: default bands at N = 256, sampled at t = 0 and t = 10.

use oceansim::analysis::{compare_fields, height_channel, FieldStats};
use oceansim::graph::Band;
use oceansim::ocean::{FrameInput, OceanSystem};
use oceansim::params::OceanConfig;
use rustfft::num_complex::Complex32;

fn scenario_config() -> OceanConfig {
    let config = OceanConfig::default();
    assert_eq!(config.grid_size, 256);
    assert_eq!(config.swell.wind_dir, [0.8, 0.2]);
    assert_eq!(config.swell.amplitude, 0.0018);
    assert_eq!(config.swell.wind_speed_m_per_s, 38.0);
    assert_eq!(config.swell.seed, 1337);
    assert_eq!(config.wind.wind_dir, [1.0, 0.0]);
    assert_eq!(config.wind.amplitude, 0.0030);
    assert_eq!(config.wind.wind_speed_m_per_s, 22.0);
    assert_eq!(config.wind.seed, 424242);
    assert_eq!(config.wind_displacement, 0.35);
    config
}

fn all_finite(field: &[Complex32]) -> bool {
    field.iter().all(|c| c.re.is_finite() && c.im.is_finite())
}

#[test]
fn test_scenario_fields_are_finite_and_evolve() {
    let mut ocean = OceanSystem::new(scenario_config()).unwrap();
    let grid = *ocean.grid();

    ocean.run_frame(&FrameInput::at_time(0.0, 1.0 / 60.0, 0));
    let at_zero = ocean.displacement().to_vec();
    assert!(all_finite(&at_zero));
    assert!(all_finite(ocean.band_field(Band::Swell)));
    assert!(all_finite(ocean.band_field(Band::Wind)));

    ocean.run_frame(&FrameInput::at_time(10.0, 1.0 / 60.0, 1));
    let at_ten = ocean.displacement().to_vec();
    assert!(all_finite(&at_ten));

    let heights = FieldStats::of(&height_channel(&grid, &at_ten));
    assert!(heights.rms > 0.0);
    assert!(compare_fields(&at_zero, &at_ten).max_abs_error > 0.0);
}

#[test]
fn test_scenario_combine_identity() {
    let mut ocean = OceanSystem::new(scenario_config()).unwrap();
    let grid = *ocean.grid();
    ocean.run_frame(&FrameInput::at_time(10.0, 1.0 / 60.0, 0));

    let swell = ocean.band_field(Band::Swell);
    let wind = ocean.band_field(Band::Wind);
    let field = ocean.displacement();
    for (x, y) in [(0, 0), (17, 203), (128, 128), (255, 1)] {
        for block in 0..3 {
            let weight = if block == 0 { 1.0 } else { 0.35 };
            let i = grid.packed_index(block, x, y);
            assert!((field[i] - (swell[i] + wind[i] * weight)).norm() < 1e-4);
        }
    }
}

#[test]
fn test_spray_pool_stays_bounded_over_frames() {
    let config = OceanConfig {
        grid_size: 64,
        particle_capacity: 64,
        ..Default::default()
    };
    let mut ocean = OceanSystem::new(config).unwrap();
    for frame in 0..30 {
        ocean.run_frame(&FrameInput::at_time(frame as f32 * 0.05, 0.05, frame));
        assert_eq!(ocean.pool().particles().len(), 64);
        assert!(ocean.pool().alive_count() <= 64);
        assert!(ocean.foam().current().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
