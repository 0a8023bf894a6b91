//! Dam-break diagnostic: collapse a column of fluid and report how it
//! settles over time.
//!
//! Run with: cargo run --release --example dam_break -p ripple-sim

use glam::Vec2;
use ripple_sim::{Boundary, SimParams, SphSimulation};

fn main() {
    env_logger::init();

    const FRAMES: usize = 600;
    const DT: f32 = 1.0 / 60.0;

    let boundary = Boundary::new(Vec2::ZERO, Vec2::new(12.0, 8.0))
        .expect("static bounds are valid");
    let mut sim = SphSimulation::new(600, boundary, SimParams::default())
        .expect("static config is valid");

    // Tall column against the left wall.
    let spawned = sim.spawn_block(
        Vec2::new(1.5, 3.0),
        Vec2::new(1.25, 2.75),
        0.25,
        Vec2::ZERO,
    );
    sim.commit_seed();
    println!("Spawned {} particles, running {} frames", spawned, FRAMES);

    for frame in 0..=FRAMES {
        if frame % 60 == 0 {
            let (front, mean_height, mean_density) = summarize(&sim);
            println!(
                "t={:>4.1}s  front x={:>5.2}  mean y={:>4.2}  mean density={:>5.2}",
                frame as f32 * DT,
                front,
                mean_height,
                mean_density,
            );
        }
        let stats = sim.step(DT, None);
        if stats.recovered > 0 {
            println!("  recovered {} particle(s)", stats.recovered);
        }
    }

    let (front, mean_height, _) = summarize(&sim);
    println!("\nFinal wave front at x={:.2}, mean height {:.2}", front, mean_height);
}

/// Right-most particle, mean height, and mean density of the fluid.
fn summarize(sim: &SphSimulation) -> (f32, f32, f32) {
    let mut front = 0.0f32;
    let mut height_sum = 0.0f32;
    let mut density_sum = 0.0f32;
    let mut count = 0usize;
    for p in sim.particles().iter().filter(|p| p.active) {
        front = front.max(p.position.x);
        height_sum += p.position.y;
        density_sum += p.density;
        count += 1;
    }
    let n = count.max(1) as f32;
    (front, height_sum / n, density_sum / n)
}
