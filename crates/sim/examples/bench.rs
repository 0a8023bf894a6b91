//! Quick benchmark for profiling the simulation step
//!
//! Run with: cargo run --release --example bench -p ripple-sim
//! Profile with: cargo flamegraph --example bench -p ripple-sim

use glam::Vec2;
use ripple_sim::{Boundary, SimParams, SphSimulation};
use std::time::Instant;

fn main() {
    env_logger::init();

    const CAPACITY: usize = 1000;
    const FRAMES: usize = 600; // 10 seconds at 60 FPS
    const DT: f32 = 1.0 / 60.0;

    let boundary = Boundary::new(Vec2::ZERO, Vec2::new(20.0, 20.0))
        .expect("static bounds are valid");
    let mut sim = SphSimulation::with_seeded_block(CAPACITY, boundary, SimParams::default(), 1)
        .expect("static config is valid");
    println!("Initial particles: {}", sim.active_count());

    // Warm up (fills hash buckets, lets the block start moving)
    println!("Warming up (60 frames)...");
    for _ in 0..60 {
        sim.step(DT, None);
    }

    println!("Running {} frames...", FRAMES);
    let start = Instant::now();
    let mut peak_speed = 0.0f32;
    for _ in 0..FRAMES {
        let stats = sim.step(DT, None);
        peak_speed = peak_speed.max(stats.max_speed);
    }
    let elapsed = start.elapsed();

    let avg_frame_time = elapsed.as_secs_f64() / FRAMES as f64;
    let fps = 1.0 / avg_frame_time;

    println!("\n=== Results ===");
    println!("Total time: {:.2?}", elapsed);
    println!("Avg step time: {:.3}ms", avg_frame_time * 1000.0);
    println!("Effective FPS: {:.1}", fps);
    println!("Peak particle speed: {:.1}", peak_speed);

    if fps < 60.0 {
        println!("\nBelow 60 FPS target at {} particles", sim.active_count());
    } else {
        println!("\nMeeting 60 FPS target at {} particles", sim.active_count());
    }
}
