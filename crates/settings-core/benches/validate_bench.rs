//! Criterion benchmarks for [`validate_draft`].
//!
//! Validation re-runs over the whole draft on every control change, so its
//! cost scales with the size of the schema.  These benchmarks measure a full
//! pass for schemas of increasing size, with and without a control map.
//!
//! Run with:
//! ```bash
//! cargo bench --package settings-core --bench validate_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use settings_core::{validate_draft, ControlMap, Schema, SettingDescriptor, SettingValue};

// ── Schema fixture builders ───────────────────────────────────────────────────

/// Builds a schema with `n` descriptors cycling through every kind.
fn build_schema(n: usize) -> Schema {
    let descriptors = (0..n)
        .map(|i| {
            let key = format!("bench.setting{i}");
            match i % 4 {
                0 => SettingDescriptor::number(&key, 5.0, Some(1.0), Some(10.0)),
                1 => SettingDescriptor::boolean(&key, true),
                2 => SettingDescriptor::text(&key, "value"),
                _ => SettingDescriptor::enumeration(&key, "b", &["a", "b", "c"]),
            }
        })
        .collect();
    Schema::new(descriptors).expect("generated keys are unique")
}

/// Binds every other descriptor to a control.
fn build_map(schema: &Schema) -> ControlMap {
    schema
        .descriptors()
        .step_by(2)
        .fold(ControlMap::new(), |map, d| {
            let id = format!("#{}", d.storage_key);
            map.bind(&id, &d.storage_key)
        })
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_validate_valid_draft(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_draft/valid");
    for &n in &[8usize, 64, 512] {
        let schema = build_schema(n);
        let draft = schema.defaults();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| validate_draft(black_box(&schema), black_box(&draft), None))
        });
    }
    group.finish();
}

fn bench_validate_invalid_draft(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_draft/all_invalid_numbers");
    for &n in &[8usize, 64, 512] {
        let schema = build_schema(n);
        let mut draft = schema.defaults();
        for value in draft.values_mut() {
            if matches!(value, SettingValue::Number(_)) {
                *value = SettingValue::Number(0.0);
            }
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| validate_draft(black_box(&schema), black_box(&draft), None))
        });
    }
    group.finish();
}

fn bench_validate_with_control_map(c: &mut Criterion) {
    let schema = build_schema(512);
    let map = build_map(&schema);
    let draft = schema.defaults();
    c.bench_function("validate_draft/512_with_map", |b| {
        b.iter(|| validate_draft(black_box(&schema), black_box(&draft), Some(&map)))
    });
}

criterion_group!(
    benches,
    bench_validate_valid_draft,
    bench_validate_invalid_draft,
    bench_validate_with_control_map
);
criterion_main!(benches);
