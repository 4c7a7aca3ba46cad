// SPDX-License-Identifier: MIT

use criterion::{Criterion, criterion_group, criterion_main};

use flatfs::flat::*;

criterion_group!(benches, flat_component_bench, flat_volume_bench);
criterion_main!(benches);

const BLOCK_SIZE: u32 = 512;
const TOTAL_BLOCKS: u32 = 4096;
const CAPACITY: u32 = 64;

/// Fills a fresh volume with a small tree: one directory per eight files.
fn populate<IO: BlockIO + ?Sized>(fs: &mut FlatFs<'_, IO>) {
    let payload = vec![0xA5u8; 3 * BLOCK_SIZE as usize + 17];
    for d in 0..4 {
        let dir = format!("/dir{d}");
        fs.create(&dir, true).expect("mkdir failed");
        for f in 0..8 {
            let path = format!("{dir}/file{f}.bin");
            fs.create(&path, false).expect("create failed");
            fs.set_content(&path, &payload).expect("write failed");
        }
    }
}

pub fn flat_component_bench(c: &mut Criterion) {
    let meta = FlatMeta::new(BLOCK_SIZE, TOTAL_BLOCKS, CAPACITY).expect("bad geometry");
    let mut buf = vec![0u8; meta.device_size() as usize];
    let mut mem_io = MemBlockIO::new(&mut buf);

    c.bench_function("flat_format_quick", |b| {
        b.iter(|| {
            let mut formatter = FlatFormatter::new(&mut mem_io, &meta);
            formatter.format(false).expect("format failed");
        });
    });

    c.bench_function("flat_format_full", |b| {
        b.iter(|| {
            let mut formatter = FlatFormatter::new(&mut mem_io, &meta);
            formatter.format(true).expect("format failed");
        });
    });

    {
        let mut fs = FlatFs::open(&mut mem_io, meta.clone()).expect("open failed");
        fs.format().expect("format failed");
        populate(&mut fs);
    }

    c.bench_function("flat_table_load", |b| {
        b.iter(|| {
            MetadataTable::load(&mut mem_io, &meta).expect("load failed");
        });
    });

    c.bench_function("flat_check", |b| {
        b.iter(|| {
            let mut checker = FlatChecker::new(&mut mem_io, &meta);
            let report = checker
                .check_with(&FlatCheckOptions::default())
                .expect("check failed");
            assert!(report.ok());
        });
    });
}

pub fn flat_volume_bench(c: &mut Criterion) {
    let meta = FlatMeta::new(BLOCK_SIZE, TOTAL_BLOCKS, CAPACITY).expect("bad geometry");

    let mut buf = vec![0u8; meta.device_size() as usize];
    let mut mem_io = MemBlockIO::new(&mut buf);

    c.bench_function("flat_populate_mem", |b| {
        b.iter(|| {
            let mut fs = FlatFs::open(&mut mem_io, meta.clone()).expect("open failed");
            fs.format().expect("format failed");
            populate(&mut fs);
        });
    });

    let mut file = tempfile::tempfile().expect("tempfile failed");
    file.set_len(meta.device_size()).expect("set_len failed");
    let mut temp_io = StdBlockIO::new(&mut file, meta.device_size());

    c.bench_function("flat_populate_file", |b| {
        b.iter(|| {
            let mut fs = FlatFs::open(&mut temp_io, meta.clone()).expect("open failed");
            fs.format().expect("format failed");
            populate(&mut fs);
        });
    });

    c.bench_function("flat_overwrite_mem", |b| {
        let mut fs = FlatFs::open(&mut mem_io, meta.clone()).expect("open failed");
        fs.format().expect("format failed");
        fs.create("/hot", false).expect("create failed");
        let data = vec![7u8; 8 * BLOCK_SIZE as usize];
        b.iter(|| fs.set_content("/hot", &data).expect("write failed"));
    });
}
