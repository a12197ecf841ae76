//! Parser Benchmarks
//!
//! Performance benchmarks for the OBJ parsing and mesh pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tessera_obj::{parse_buffers, LoadFlags};

/// Build a synthetic multi-object OBJ with `objects` grid patches of
/// `quads_per_side`^2 quads each.
fn synthetic_obj(objects: usize, quads_per_side: usize) -> Vec<u8> {
    let mut out = String::from("mtllib synthetic.mtl\n");
    let side = quads_per_side + 1;

    for object in 0..objects {
        out.push_str(&format!("o patch{object}\n"));
        for y in 0..side {
            for x in 0..side {
                out.push_str(&format!("v {x} {y} {object}\n"));
                out.push_str(&format!(
                    "vt {} {}\n",
                    x as f32 / quads_per_side as f32,
                    y as f32 / quads_per_side as f32
                ));
                out.push_str("vn 0 0 1\n");
            }
        }
        out.push_str(&format!("usemtl mat{object}\n"));

        let base = object * side * side;
        for y in 0..quads_per_side {
            for x in 0..quads_per_side {
                let a = base + y * side + x + 1;
                let b = a + 1;
                let c = a + side + 1;
                let d = a + side;
                out.push_str(&format!(
                    "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c} {d}/{d}/{d}\n"
                ));
            }
        }
    }

    out.into_bytes()
}

fn synthetic_mtl(materials: usize) -> Vec<u8> {
    let mut out = String::new();
    for material in 0..materials {
        out.push_str(&format!(
            "newmtl mat{material}\nmap_Kd mat{material}_d.png\nmap_Bump mat{material}_n.png\n"
        ));
    }
    out.into_bytes()
}

fn bench_parse_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_only");

    for quads in [8, 32, 64].iter() {
        let obj = synthetic_obj(4, *quads);
        let mtl = synthetic_mtl(4);

        group.bench_with_input(BenchmarkId::from_parameter(quads), quads, |b, _| {
            b.iter(|| {
                let model =
                    parse_buffers(black_box(&obj), black_box(&mtl), LoadFlags::empty()).unwrap();
                black_box(model.meshes.len())
            });
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    let obj = synthetic_obj(4, 32);
    let mtl = synthetic_mtl(4);

    group.bench_function("tangents_join_combine", |b| {
        let flags = LoadFlags::CALCULATE_TANGENTS
            | LoadFlags::JOIN_IDENTICAL
            | LoadFlags::COMBINE_MESHES;
        b.iter(|| {
            let model = parse_buffers(black_box(&obj), black_box(&mtl), flags).unwrap();
            black_box(model.combined_meshes.len())
        });
    });

    group.bench_function("join_only", |b| {
        b.iter(|| {
            let model =
                parse_buffers(black_box(&obj), black_box(&mtl), LoadFlags::JOIN_IDENTICAL)
                    .unwrap();
            black_box(model.meshes.len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse_only, bench_full_pipeline);
criterion_main!(benches);
