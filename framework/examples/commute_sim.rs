//! Simulates a short city commute to exercise the motion pipeline end to end
//!
//! Phases: PARKED → PULL AWAY → CRUISE (with accuracy dropouts and one
//! position jump) → RED LIGHT → CRUISE → PARKED. Fix noise mimics a phone
//! receiver: a few meters of jitter and occasional poor-accuracy fixes.
//!
//! Run with: cargo run -p motion-core --example commute_sim

use motion_core::{
    Fix, FixProcessor, MotionSnapshot, OverlayConfig, PathTrail, ProfileSwitcher, SpeedReadout,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Meters per degree of latitude
const M_PER_DEG: f64 = 111_195.0;

/// Along-track position jitter of a phone receiver (m)
const JITTER_M: f64 = 1.5;

struct Sim {
    processor: FixProcessor,
    readout: SpeedReadout,
    profile: ProfileSwitcher,
    trail: PathTrail,
    /// Seeded so every run prints the same trace
    rng: StdRng,
    /// Northward distance travelled (m)
    north_m: f64,
    t_ms: u64,
}

impl Sim {
    fn new(config: OverlayConfig) -> Self {
        Self {
            processor: FixProcessor::new(config.motion),
            readout: SpeedReadout::new(config.display.unit),
            profile: ProfileSwitcher::new(config.power_save),
            trail: PathTrail::new(config.trail.capacity, config.motion.movement_threshold_mps),
            rng: StdRng::seed_from_u64(42),
            north_m: 0.0,
            t_ms: 0,
        }
    }

    /// Advance one 2 s fix at `speed_mps`, with `accuracy` meters reported
    fn step(&mut self, speed_mps: f64, accuracy: f64) -> MotionSnapshot {
        self.t_ms += 2000;
        self.north_m += speed_mps * 2.0;

        // Stays under the 5 m drift gate
        let jitter = self.rng.random_range(-JITTER_M..=JITTER_M);
        let lat = 40.0 + (self.north_m + jitter) / M_PER_DEG;
        let fix = Fix::new(lat, -74.0, accuracy, self.t_ms);

        let snapshot = self.processor.ingest(fix);
        self.trail.record(fix.position(), &snapshot);
        if let Some(options) = self.profile.observe(&snapshot) {
            println!(
                "  [t={:>6} ms] sampling → high_accuracy={} max_age={} ms",
                self.t_ms, options.high_accuracy, options.maximum_age_ms
            );
        }
        if snapshot.should_refresh_stationary_info {
            println!("  [t={:>6} ms] refresh weather/time", self.t_ms);
            self.processor.acknowledge_refresh(self.t_ms);
        }
        snapshot
    }

    fn report(&mut self, label: &str, snapshot: &MotionSnapshot) {
        let reading = self.readout.update(snapshot.smoothed_speed_mps);
        println!(
            "  {:<10} {:>5.1} {:<4} {:<16} {:<3} {}",
            label,
            reading.value,
            reading.unit,
            reading.band.as_str(),
            snapshot.cardinal.map(|c| c.as_str()).unwrap_or("-"),
            snapshot.motion_state.as_str()
        );
    }

    fn phase(&mut self, name: &str, fixes: usize, speed_mps: f64) {
        println!("\n{} ({} fixes @ {:.1} m/s)", name, fixes, speed_mps);
        for i in 0..fixes {
            let snapshot = self.step(speed_mps, 8.0);
            if i % 3 == 2 || i + 1 == fixes {
                self.report(name, &snapshot);
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = OverlayConfig::default();
    config.apply_query("powersave=true&unit=kmh");
    let mut sim = Sim::new(config);

    println!("=== Commute Motion Simulation ===");

    // First fix bootstraps with whatever accuracy the receiver has
    let first = sim.step(0.0, 120.0);
    sim.report("BOOT", &first);

    sim.phase("PARKED", 4, 0.0);
    sim.phase("PULL AWAY", 4, 4.0);
    sim.phase("CRUISE", 6, 13.0);

    println!("\nDROPOUT (poor accuracy fixes are skipped)");
    for _ in 0..3 {
        let snapshot = sim.step(13.0, 85.0);
        sim.report("DROPOUT", &snapshot);
    }

    println!("\nJUMP (multipath puts us 2 km ahead)");
    sim.north_m += 2000.0;
    let snapshot = sim.step(13.0, 10.0);
    sim.report("JUMP", &snapshot);

    sim.phase("CRUISE", 4, 13.0);
    sim.phase("RED LIGHT", 8, 0.0);
    sim.phase("CRUISE", 5, 11.0);
    sim.phase("PARKED", 10, 0.0);

    let stats = sim.processor.stats();
    println!("\n=== Summary ===");
    println!(
        "  fixes: {} received, {} accepted, {} rejected, {} held, {} glitches",
        stats.received, stats.accepted, stats.rejected, stats.held, stats.glitches
    );
    println!("  trail points: {}", sim.trail.len());
    println!(
        "  final state: {} for {} ms",
        sim.processor.motion_state().as_str(),
        sim.processor
            .last_snapshot()
            .and_then(|s| s.stationary_duration_ms)
            .unwrap_or(0)
    );
}
