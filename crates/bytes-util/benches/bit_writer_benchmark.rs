use std::hint::black_box;

use bytes_util::BitWriter;
use criterion::{Criterion, criterion_group, criterion_main};

fn benchmark_bit_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("BitWriter");

    group.bench_function("odd widths (64 KiB)", |b| {
        b.iter(|| {
            let mut writer = BitWriter::new();
            for i in 0..(64 * 1024 * 8 / 13) {
                writer.append_bits(13, black_box(i as u64));
            }
            writer.byte_align();
            writer.flush();
            black_box(writer.bytes_in_buffer())
        })
    });

    group.bench_function("zero padding with emulation prevention (64 KiB)", |b| {
        b.iter(|| {
            let mut writer = BitWriter::new();
            writer.set_emulation_prevention(true);
            for _ in 0..(64 * 1024 / 8) {
                writer.append_bits(64, black_box(0));
            }
            writer.flush();
            black_box(writer.bytes_in_buffer())
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_bit_writer);
criterion_main!(benches);
