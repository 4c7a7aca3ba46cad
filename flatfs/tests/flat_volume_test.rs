// SPDX-License-Identifier: MIT

use flatfs::flat::*;

/// 16 blocks of 64 bytes, 4 table slots.
fn small_meta() -> FlatMeta {
    FlatMeta::new(64, 16, 4).unwrap()
}

fn device(meta: &FlatMeta) -> Vec<u8> {
    vec![0u8; meta.device_size() as usize]
}

fn kind<T: core::fmt::Debug>(r: FsResult<T>) -> FsErrorKind {
    r.unwrap_err().kind()
}

/// Runs held by every file, read straight from the device.
fn file_runs(io: &mut MemBlockIO<'_>, meta: &FlatMeta) -> Vec<BlockRun> {
    let table = MetadataTable::load(io, meta).unwrap();
    table.iter_used().filter_map(|(_, e)| e.run(meta)).collect()
}

#[test]
fn scenario_write_read_remove() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta.clone()).unwrap();

    fs.create("/a.txt", false).unwrap();
    fs.set_content("/a.txt", b"hello").unwrap();
    assert_eq!(fs.get_content("/a.txt").unwrap(), b"hello");

    fs.remove_file("/a.txt").unwrap();
    assert!(fs.list("/").unwrap().is_empty());
    assert_eq!(fs.usage().unwrap().used_blocks, 0);
    drop(fs);

    let bitmap = meta.bitmap_offset as usize;
    assert_eq!(&io.as_slice()[bitmap..bitmap + 2], &[0, 0]);
}

#[test]
fn scenario_nested_listing() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/d", true).unwrap();
    fs.create("/d/f", false).unwrap();

    let inner = fs.list("/d").unwrap();
    assert_eq!(
        inner,
        vec![DirEntryInfo {
            name: "f".into(),
            is_directory: false,
            size: 0
        }]
    );
    let top = fs.list("/").unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "d");
    assert!(top[0].is_directory);
}

#[test]
fn scenario_full_device() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/big", false).unwrap();
    fs.set_content("/big", &[0x5A; 16 * 64]).unwrap();
    assert_eq!(fs.usage().unwrap().free_blocks, 0);

    assert_eq!(kind(fs.create("/small", false)), FsErrorKind::OutOfSpace);
    // nothing half-created
    assert_eq!(fs.list("/").unwrap().len(), 1);
    assert_eq!(fs.get_content("/big").unwrap(), vec![0x5A; 16 * 64]);
}

#[test]
fn format_is_idempotent() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/d", true).unwrap();
    fs.create("/d/x", false).unwrap();
    fs.set_content("/d/x", &[1; 300]).unwrap();

    fs.format().unwrap();
    fs.format().unwrap();

    assert!(fs.list("/").unwrap().is_empty());
    let usage = fs.usage().unwrap();
    assert_eq!(usage.used_blocks, 0);
    assert_eq!(usage.used_entries, 1);
    assert!(fs.check().unwrap().ok());
}

#[test]
fn runs_never_overlap_and_match_bitmap() {
    let meta = FlatMeta::new(32, 64, 8).unwrap();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    {
        let mut fs = FlatFs::open(&mut io, meta.clone()).unwrap();
        let sizes = [10usize, 100, 0, 65, 33, 200];
        for (i, size) in sizes.iter().enumerate() {
            let path = format!("/f{i}");
            fs.create(&path, false).unwrap();
            fs.set_content(&path, &vec![i as u8; *size]).unwrap();
        }
        // rewrite a couple so freed holes get reused
        fs.set_content("/f1", &[9; 20]).unwrap();
        fs.set_content("/f3", &[8; 150]).unwrap();
        fs.remove_file("/f2").unwrap();

        let report = fs.check().unwrap();
        assert!(report.ok(), "{report}");
        assert_eq!(report.count(Severity::Warn), 0, "{report}");
    }

    let runs = file_runs(&mut io, &meta);
    for (i, a) in runs.iter().enumerate() {
        for b in &runs[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }

    let held: u32 = runs.iter().map(|r| r.count).sum();
    let alloc = FlatAllocator::load(&mut io, &meta).unwrap();
    assert_eq!(alloc.used_units(), held as usize);
}

#[test]
fn content_round_trips_across_sizes() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();
    fs.create("/f", false).unwrap();

    for len in [0usize, 1, 63, 64, 65, 128, 500, 1024] {
        let data: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
        fs.set_content("/f", &data).unwrap();
        assert_eq!(fs.get_content("/f").unwrap(), data, "len {len}");
        assert_eq!(fs.list("/").unwrap()[0].size as usize, len);
    }
}

#[test]
fn names_are_unique_per_directory() {
    let meta = FlatMeta::new(64, 16, 8).unwrap();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/x", false).unwrap();
    assert_eq!(kind(fs.create("/x", false)), FsErrorKind::AlreadyExists);
    assert_eq!(kind(fs.create("/x", true)), FsErrorKind::AlreadyExists);

    fs.create("/d", true).unwrap();
    fs.create("/d/x", false).unwrap();
    assert_eq!(kind(fs.create("/", true)), FsErrorKind::AlreadyExists);
}

#[test]
fn table_capacity_boundary() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    // the root takes one of the four slots
    fs.create("/a", false).unwrap();
    fs.create("/b", true).unwrap();
    fs.create("/c", false).unwrap();
    assert_eq!(kind(fs.create("/d", false)), FsErrorKind::TableFull);

    fs.remove_file("/a").unwrap();
    fs.create("/d", false).unwrap();
    let names: Vec<String> = fs.list("/").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["b", "c", "d"]);
}

#[test]
fn failed_create_writes_nothing() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut mem = MemBlockIO::new(&mut buf);
    {
        let mut fs = FlatFs::open(&mut mem, meta.clone()).unwrap();
        for p in ["/a", "/b", "/c"] {
            fs.create(p, false).unwrap();
        }
    }

    let mut io = IOCounter::new(&mut mem);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();
    assert_eq!(kind(fs.create("/d", false)), FsErrorKind::TableFull);
    assert_eq!(kind(fs.create("/a", false)), FsErrorKind::AlreadyExists);
    assert_eq!(kind(fs.create("/nope/x", false)), FsErrorKind::ParentNotFound);
    drop(fs);
    assert_eq!(io.snapshot().writes, 0);
}

#[test]
fn path_errors() {
    let meta = FlatMeta::new(64, 16, 8).unwrap();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();
    fs.create("/f", false).unwrap();
    fs.create("/d", true).unwrap();

    assert_eq!(kind(fs.create("", false)), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.create("rel", false)), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.create(&format!("/{}", "n".repeat(32)), false)), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.create("/d/..", true)), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.create("/f/x", false)), FsErrorKind::NotADirectory);
    assert_eq!(kind(fs.create("/ghost/x", false)), FsErrorKind::ParentNotFound);

    assert_eq!(kind(fs.get_content("/ghost")), FsErrorKind::NotFound);
    assert_eq!(kind(fs.get_content("/d")), FsErrorKind::IsADirectory);
    assert_eq!(kind(fs.set_content("/d", b"x")), FsErrorKind::IsADirectory);
    assert_eq!(kind(fs.list("/f")), FsErrorKind::NotADirectory);
    assert_eq!(kind(fs.list("/f/x")), FsErrorKind::NotADirectory);
    assert_eq!(kind(fs.remove_file("/d")), FsErrorKind::IsADirectory);
    assert_eq!(kind(fs.remove_directory("/f")), FsErrorKind::NotADirectory);
    assert_eq!(kind(fs.remove_directory("/")), FsErrorKind::InvalidPath);

    // empty segments are ignored
    fs.create("//d//g/", false).unwrap();
    assert_eq!(fs.list("/d/").unwrap()[0].name, "g");
}

#[test]
fn directory_removal() {
    let meta = FlatMeta::new(64, 16, 8).unwrap();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/d", true).unwrap();
    fs.create("/d/f", false).unwrap();
    assert_eq!(kind(fs.remove_directory("/d")), FsErrorKind::NotEmpty);

    fs.remove_file("/d/f").unwrap();
    fs.remove_directory("/d").unwrap();
    assert_eq!(kind(fs.list("/d")), FsErrorKind::NotFound);
    assert!(fs.check().unwrap().ok());
}

#[test]
fn move_renames_in_place() {
    let meta = FlatMeta::new(64, 16, 8).unwrap();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/a", false).unwrap();
    fs.set_content("/a", b"payload").unwrap();
    fs.create("/b", false).unwrap();
    fs.create("/d", true).unwrap();

    fs.move_entry("/a", "/c").unwrap();
    assert_eq!(fs.get_content("/c").unwrap(), b"payload");
    assert_eq!(kind(fs.get_content("/a")), FsErrorKind::NotFound);

    // same name is a no-op
    fs.move_entry("/c", "/c").unwrap();

    assert_eq!(kind(fs.move_entry("/c", "/b")), FsErrorKind::AlreadyExists);
    assert_eq!(kind(fs.move_entry("/c", "/d/c")), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.move_entry("/c", "")), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.move_entry("c", "/e")), FsErrorKind::InvalidPath);
    assert_eq!(kind(fs.move_entry("/zz", "/e")), FsErrorKind::NotFound);
    assert_eq!(kind(fs.move_entry("/", "/e")), FsErrorKind::InvalidPath);

    // order in the parent is kept
    let names: Vec<String> = fs.list("/").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["c", "b", "d"]);
}

#[test]
fn reclaim_keeps_usage_flat() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();
    fs.create("/f", false).unwrap();

    for _ in 0..10 {
        fs.set_content("/f", &[3; 200]).unwrap();
    }
    assert_eq!(fs.usage().unwrap().used_blocks, 4);
}

#[test]
fn reclaim_rolls_back_on_out_of_space() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let mut fs = FlatFs::open(&mut io, meta).unwrap();

    fs.create("/a", false).unwrap();
    fs.set_content("/a", &[1; 6 * 64]).unwrap();
    fs.create("/b", false).unwrap();
    fs.set_content("/b", &[2; 6 * 64]).unwrap();
    let before = fs.usage().unwrap();

    // 6 own + 4 free blocks, but no run of 10
    assert_eq!(kind(fs.set_content("/a", &[7; 10 * 64])), FsErrorKind::OutOfSpace);
    assert_eq!(fs.usage().unwrap(), before);
    assert_eq!(fs.get_content("/a").unwrap(), vec![1; 6 * 64]);
}

#[test]
fn leak_policy_never_frees_on_overwrite() {
    let meta = small_meta();
    let mut buf = device(&meta);
    let mut io = MemBlockIO::new(&mut buf);
    let options = FlatOptions {
        overwrite: OverwritePolicy::Leak,
        ..FlatOptions::default()
    };
    let mut fs = FlatFs::open_with(&mut io, meta, options).unwrap();

    fs.create("/f", false).unwrap();
    fs.set_content("/f", &[1; 64]).unwrap();
    fs.set_content("/f", &[2; 64]).unwrap();
    assert_eq!(fs.get_content("/f").unwrap(), vec![2; 64]);
    assert_eq!(fs.usage().unwrap().used_blocks, 3);

    let report = fs.check().unwrap();
    assert!(report.ok());
    assert!(report.has_code("ALLOC.LEAKED"));

    // removal frees only the current run
    fs.remove_file("/f").unwrap();
    assert_eq!(fs.usage().unwrap().used_blocks, 2);
}

#[test]
fn state_survives_reopen_on_file() {
    let meta = small_meta();
    let mut file = tempfile::tempfile().unwrap();
    file.set_len(meta.device_size()).unwrap();

    {
        let mut io = StdBlockIO::new(&mut file, meta.device_size());
        let mut fs = FlatFs::open(&mut io, meta.clone()).unwrap();
        assert!(fs.formatted_on_open());
        fs.create("/notes", true).unwrap();
        fs.create("/notes/today", false).unwrap();
        fs.set_content("/notes/today", b"line one\nline two\n").unwrap();
        fs.flush().unwrap();
    }

    let mut io = StdBlockIO::new(&mut file, meta.device_size());
    let mut fs = FlatFs::open(&mut io, meta).unwrap();
    assert!(!fs.formatted_on_open());
    assert_eq!(
        fs.get_content("/notes/today").unwrap(),
        b"line one\nline two\n"
    );
}
