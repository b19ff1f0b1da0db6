// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Benchmark comparing the library xyz formatter against a scalar baseline
//!
//! Run with: cargo bench --bench format_points_bench
//! Or cross-compile and run on target

use edgefirst_lightwarepub::formats::{XYZ_POINT_STEP, format_points_12byte};
use std::time::{Duration, Instant};

const BATCH_SIZES: [usize; 4] = [1, 100, 1000, 4096];
const ITERATIONS: usize = 10_000;

struct Points {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
}

impl Points {
    /// Points along a sweep of the SF45B head.
    fn sweep(size: usize) -> Self {
        let mut points = Self {
            x: vec![0.0; size],
            y: vec![0.0; size],
            z: vec![0.0; size],
        };
        for i in 0..size {
            let face = ((i % 320) as f32 - 160.0).to_radians();
            let distance = 1.0 + (i % 400) as f32 * 0.1;
            points.x[i] = distance * -face.cos();
            points.y[i] = distance * face.sin();
        }
        points
    }
}

/// Iterator based baseline
#[inline(never)]
fn format_points_scalar(points: &Points, n_points: usize) -> Vec<u8> {
    points.x[..n_points]
        .iter()
        .zip(&points.y[..n_points])
        .zip(&points.z[..n_points])
        .flat_map(|((x, y), z)| {
            let mut record = [0u8; XYZ_POINT_STEP];
            record[0..4].copy_from_slice(&x.to_le_bytes());
            record[4..8].copy_from_slice(&y.to_le_bytes());
            record[8..12].copy_from_slice(&z.to_le_bytes());
            record
        })
        .collect()
}

#[inline(never)]
fn format_points_library(points: &Points, n_points: usize) -> Vec<u8> {
    format_points_12byte(&points.x, &points.y, &points.z, n_points)
}

fn benchmark<F>(name: &str, f: F, points: &Points, n_points: usize) -> Duration
where
    F: Fn(&Points, usize) -> Vec<u8>,
{
    // Warmup
    for _ in 0..10 {
        std::hint::black_box(f(points, n_points));
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        std::hint::black_box(f(points, n_points));
    }
    let elapsed = start.elapsed();

    let per_iter = elapsed / ITERATIONS as u32;
    let throughput = (n_points as f64 * ITERATIONS as f64) / elapsed.as_secs_f64();

    println!(
        "{:25} {:>10.3} µs/batch  {:>10.1} Mpts/s",
        name,
        per_iter.as_secs_f64() * 1_000_000.0,
        throughput / 1_000_000.0
    );

    elapsed
}

fn main() {
    println!("Point Cloud Formatting Benchmark");
    println!("================================");
    println!("Iterations: {}", ITERATIONS);
    #[cfg(target_arch = "aarch64")]
    println!("Architecture: aarch64 (NEON available)");
    #[cfg(all(target_arch = "x86_64", feature = "portable_simd"))]
    println!("Architecture: x86_64 (portable SIMD)");
    #[cfg(all(target_arch = "x86_64", not(feature = "portable_simd")))]
    println!("Architecture: x86_64 (scalar)");

    for n_points in BATCH_SIZES {
        let points = Points::sweep(n_points);

        assert_eq!(
            format_points_scalar(&points, n_points),
            format_points_library(&points, n_points),
            "Library formatter mismatch!"
        );

        println!();
        println!("Points per batch: {}", n_points);
        let scalar_time = benchmark("Scalar (iterator)", format_points_scalar, &points, n_points);
        let library_time = benchmark("Library", format_points_library, &points, n_points);
        println!(
            "Speedup vs scalar:        {:.2}x",
            scalar_time.as_secs_f64() / library_time.as_secs_f64()
        );
    }
}
