use soft_fov::{
    CombineStrategy, FovAlgorithm, FovConfig, Grid, IntPoint, RhombusFov, SpiralFov,
    SymmetryConfig, verify_symmetry,
};

fn main() {
    env_logger::init();

    // Check for command line arguments
    let args: Vec<String> = std::env::args().collect();

    let result = if args.len() > 1 && args[1] == "--benchmark" {
        run_benchmark()
    } else if args.len() > 1 && args[1] == "--symmetry" {
        run_symmetry()
    } else {
        println!("Soft FOV");
        println!("Run with --benchmark to test performance");
        println!("Run with --symmetry to check visibility symmetry");
        println!();
        run_demo()
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Open floor with a regular pattern of pillars and a few translucent cells.
fn pillar_map(width: usize, height: usize) -> Grid<f32> {
    let mut grid = Grid::new(width, height, 1.0);
    for p in grid.positions().collect::<Vec<_>>() {
        if p.x % 6 == 3 && p.y % 5 == 2 {
            grid[p] = 0.0;
        } else if (p.x + 2 * p.y) % 17 == 0 {
            grid[p] = 0.5;
        }
    }
    grid
}

fn run_demo() -> soft_fov::Result<()> {
    let opacity = pillar_map(21, 15);
    let fov = SpiralFov::new(&FovConfig::default())?;
    let viewer = IntPoint::new(10, 7);

    let visibility = fov.compute(viewer, 8.0, &opacity)?;
    println!("Visibility from {} (radius 8):", viewer);
    print!("{}", visibility.to_display_string());
    Ok(())
}

fn run_benchmark() -> soft_fov::Result<()> {
    use std::time::Instant;

    println!("=== Spiral FOV Benchmark ===\n");

    // Test parameters
    let sizes = [(50, 50), (100, 100), (200, 200)];
    let iterations = 20;
    let radius = 20.0f32;
    let fov = SpiralFov::new(&FovConfig::default())?;

    for (width, height) in sizes {
        println!("Grid size: {}x{}", width, height);
        println!("-----------------------");

        let opacity = pillar_map(width, height);
        let viewer = IntPoint::new(width as i32 / 2, height as i32 / 2);

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = fov.compute(viewer, radius, &opacity)?;
        }
        let avg_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;
        println!("  Single query: {:.3} ms/iter", avg_ms);
        println!();
    }

    // Many viewers at once (e.g. every actor on a level)
    println!("=== Batch of Viewers ===\n");

    let (width, height) = (100, 100);
    let opacity = pillar_map(width, height);
    let viewers: Vec<IntPoint> = (0..16)
        .map(|i| IntPoint::new(10 + (i % 4) * 25, 10 + (i / 4) * 25))
        .collect();

    let start = Instant::now();
    for _ in 0..iterations {
        for &viewer in &viewers {
            let _ = fov.compute(viewer, radius, &opacity)?;
        }
    }
    let elapsed_sequential = start.elapsed();
    let avg_sequential_ms = elapsed_sequential.as_secs_f64() * 1000.0 / iterations as f64;

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = fov.compute_batch(&viewers, radius, &opacity)?;
    }
    let elapsed_parallel = start.elapsed();
    let avg_parallel_ms = elapsed_parallel.as_secs_f64() * 1000.0 / iterations as f64;

    let speedup = avg_sequential_ms / avg_parallel_ms;

    println!("Grid size: {}x{}, {} viewers", width, height, viewers.len());
    println!("-----------------------");
    println!("  Sequential:       {:.3} ms/iter", avg_sequential_ms);
    println!("  Parallel (rayon): {:.3} ms/iter", avg_parallel_ms);
    println!("  Speedup: {:.2}x", speedup);
    Ok(())
}

fn run_symmetry() -> soft_fov::Result<()> {
    println!("=== Symmetry Check ===\n");

    let opacity = pillar_map(60, 40);
    let radius = 9.0;
    let config = SymmetryConfig {
        sample_count: 500,
        ..SymmetryConfig::default()
    };

    let spiral_fov = SpiralFov::new(&FovConfig::default())?;
    let spiral = spiral_fov.spiral();
    let mismatches = verify_symmetry(&spiral_fov, spiral, radius, &opacity, &config)?;
    report("spiral scan", &mismatches, config.sample_count);

    for combine in [CombineStrategy::Add, CombineStrategy::Max] {
        let rhombus = RhombusFov::with_combine(combine);
        let mismatches = verify_symmetry(&rhombus, spiral, radius, &opacity, &config)?;
        report(&format!("rhombus ({:?})", combine), &mismatches, config.sample_count);
    }
    Ok(())
}

fn report(name: &str, mismatches: &[soft_fov::SymmetryMismatch], samples: usize) {
    println!("{}: {} asymmetric of {} pairs", name, mismatches.len(), samples);
    if let Some(worst) = mismatches
        .iter()
        .max_by(|a, b| a.difference().total_cmp(&b.difference()))
    {
        println!("  worst: {}", worst);
    }
}
