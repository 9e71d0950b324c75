use std::fmt::Write;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use wake_mesh::prelude::*;

/// Flat rectangular wing, span 8, chord 1, trailing edge first.
fn flat_wing(ni: usize, nj: usize) -> GeometrySource {
    let point = |i: usize, j: usize| {
        let y = 8.0 * i as f64 / (ni - 1) as f64;
        let x = 1.0 - j as f64 / (nj - 1) as f64;
        (x, y)
    };
    let mut text = String::new();
    writeln!(text, "SURFACE_NODE,{ni},{nj}\nx,y,z,u,v").unwrap();
    for i in 0..ni {
        for j in 0..nj {
            let (x, y) = point(i, j);
            writeln!(text, "{x},{y},0,{i},{j}").unwrap();
        }
    }
    writeln!(text, "PLATE,{ni},{nj}\nnx,ny,nz").unwrap();
    for _ in 0..ni {
        text.push_str("0,0,1\n");
    }
    text.push_str("x,y,z,camber,xxx,Nx,Ny,Nz,u,xxx,v\n");
    for i in 0..ni {
        for j in 0..nj {
            let (x, y) = point(i, j);
            let (u, v) = (i as f64 / (ni - 1) as f64, j as f64 / (nj - 1) as f64);
            writeln!(text, "{x},{y},0,0,0,0,0,1,{u},0,{v}").unwrap();
        }
    }
    GeometrySource::FlatPlateWing {
        name: "MainWing".into(),
        text,
    }
}

fn bench_surface_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_build");

    for &n in &[17usize, 33] {
        let source = flat_wing(n, n);

        group.bench_with_input(BenchmarkId::new("finest_only", n), &source, |b, src| {
            let builder = SurfaceBuilder::new(SurfaceOptions {
                build_hierarchy: false,
                ..SurfaceOptions::default()
            });
            b.iter(|| black_box(builder.build(src).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("with_hierarchy", n), &source, |b, src| {
            let builder = SurfaceBuilder::default();
            b.iter(|| black_box(builder.build(src).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_surface_build);
criterion_main!(benches);
