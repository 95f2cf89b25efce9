    use super::*;
    use bloark_core::line_offsets as read_offsets;
    use serde_json::json;
    use std::io::Write as _;
    use tempfile::tempdir;

    fn seed_warehouse(dir: &Path, base: Base, records: &[Value]) -> (PathBuf, PathBuf) {
        let payload = bloark_storage::payload_path(dir, base);
        let mut byte_start = 0u64;
        let mut f = File::create(&payload).expect("create");
        let mut meta = File::create(bloark_storage::metadata_path(dir, base)).expect("create");
        for record in records {
            let line = record.to_string();
            writeln!(f, "{line}").expect("write");
            let byte_end = byte_start + line.len() as u64 + 1;
            let metadata = Metadata {
                id: "1".into(),
                title: "Alpha".into(),
                source_revision: None,
                categories: vec![],
                byte_start,
                byte_end,
            };
            writeln!(meta, "{}", metadata.to_line().expect("serialize")).expect("write");
            byte_start = byte_end;
        }
        drop(f);
        let compressed = bloark_storage::compressed_payload_path(dir, base);
        compress_zstd(&payload, &compressed, 3).expect("compress");
        fs::remove_file(&payload).expect("remove uncompressed");
        (compressed, bloark_storage::metadata_path(dir, base))
    }

    #[tokio::test]
    async fn profiles_rewrite_records_in_place() {
        let src_dir = tempdir().expect("tempdir");
        let (payload, metadata) =
            seed_warehouse(src_dir.path(), Base(0), &[json!({"article_id": "1", "n": 1})]);

        let out_dir = tempdir().expect("tempdir");
        let mut modifier = Modifier::new(out_dir.path()).with_workers(1).with_max_size(1_000_000);
        modifier.add_profile(|mut content: Value, metadata: &Metadata| {
            content["n"] = json!(99);
            (Some(content), Some(metadata.clone()))
        });
        modifier.preload(&payload).expect("preload");

        let ctx = ModifyContext {
            output_dir: out_dir.path().to_path_buf(),
            temp_dir: out_dir.path().join("temp"),
            allocator: Arc::new(WarehouseAllocator::new(out_dir.path(), 1_000_000, false)),
            compress: false,
            profiles: modifier.profiles.clone(),
        };
        fs::create_dir_all(&ctx.temp_dir).expect("mkdir");

        run_modify(&payload, &metadata, &ctx);

        let new_payload = bloark_storage::payload_path(out_dir.path(), Base(0));
        let contents = fs::read_to_string(&new_payload).expect("read");
        assert!(contents.contains("99"));
    }

    #[tokio::test]
    async fn none_content_drops_only_that_record_and_the_segment_continues() {
        let src_dir = tempdir().expect("tempdir");
        let (payload, metadata) = seed_warehouse(
            src_dir.path(),
            Base(0),
            &[
                json!({"article_id": "1", "n": 1}),
                json!({"article_id": "1", "n": 2}),
                json!({"article_id": "1", "n": 3}),
            ],
        );

        let out_dir = tempdir().expect("tempdir");
        let mut modifier = Modifier::new(out_dir.path());
        modifier.add_profile(|content: Value, metadata: &Metadata| {
            if content["n"] == json!(2) {
                (None, Some(metadata.clone()))
            } else {
                (Some(content), Some(metadata.clone()))
            }
        });

        let ctx = ModifyContext {
            output_dir: out_dir.path().to_path_buf(),
            temp_dir: out_dir.path().join("temp"),
            allocator: Arc::new(WarehouseAllocator::new(out_dir.path(), 1_000_000, false)),
            compress: false,
            profiles: modifier.profiles.clone(),
        };
        fs::create_dir_all(&ctx.temp_dir).expect("mkdir");

        run_modify(&payload, &metadata, &ctx);

        let new_payload = bloark_storage::payload_path(out_dir.path(), Base(0));
        let contents = fs::read_to_string(&new_payload).expect("read");
        assert!(contents.contains("\"n\":1"));
        assert!(!contents.contains("\"n\":2"), "record 2 was dropped");
        assert!(contents.contains("\"n\":3"), "record after a drop still runs");
    }

    #[tokio::test]
    async fn none_metadata_drops_the_whole_segment_and_truncates() {
        let src_dir = tempdir().expect("tempdir");
        let (payload, metadata) = seed_warehouse(
            src_dir.path(),
            Base(0),
            &[json!({"article_id": "1", "n": 1}), json!({"article_id": "1", "n": 2})],
        );

        let out_dir = tempdir().expect("tempdir");
        let mut modifier = Modifier::new(out_dir.path());
        modifier.add_profile(|content: Value, _metadata: &Metadata| {
            if content["n"] == json!(2) {
                (Some(content), None)
            } else {
                (Some(content), Some(Metadata {
                    id: "1".into(),
                    title: "Alpha".into(),
                    source_revision: None,
                    categories: vec![],
                    byte_start: 0,
                    byte_end: 0,
                }))
            }
        });

        let ctx = ModifyContext {
            output_dir: out_dir.path().to_path_buf(),
            temp_dir: out_dir.path().join("temp"),
            allocator: Arc::new(WarehouseAllocator::new(out_dir.path(), 1_000_000, false)),
            compress: false,
            profiles: modifier.profiles.clone(),
        };
        fs::create_dir_all(&ctx.temp_dir).expect("mkdir");

        run_modify(&payload, &metadata, &ctx);

        let new_metadata = bloark_storage::metadata_path(out_dir.path(), Base(0));
        let offsets = read_offsets(&new_metadata).expect("offsets");
        assert!(offsets.is_empty(), "dropped segment writes no metadata line");

        let new_payload = bloark_storage::payload_path(out_dir.path(), Base(0));
        assert_eq!(file_size(&new_payload).expect("size"), 0, "truncated back to byte_start");
    }

    #[tokio::test]
    async fn a_panicking_profile_drops_only_its_record_and_the_segment_continues() {
        let src_dir = tempdir().expect("tempdir");
        let (payload, metadata) = seed_warehouse(
            src_dir.path(),
            Base(0),
            &[
                json!({"article_id": "1", "n": 1}),
                json!({"article_id": "1", "n": 2}),
                json!({"article_id": "1", "n": 3}),
            ],
        );

        let out_dir = tempdir().expect("tempdir");
        let mut modifier = Modifier::new(out_dir.path());
        modifier.add_profile(|content: Value, metadata: &Metadata| {
            if content["n"] == json!(2) {
                panic!("boom");
            }
            (Some(content), Some(metadata.clone()))
        });

        let ctx = ModifyContext {
            output_dir: out_dir.path().to_path_buf(),
            temp_dir: out_dir.path().join("temp"),
            allocator: Arc::new(WarehouseAllocator::new(out_dir.path(), 1_000_000, false)),
            compress: false,
            profiles: modifier.profiles.clone(),
        };
        fs::create_dir_all(&ctx.temp_dir).expect("mkdir");

        run_modify(&payload, &metadata, &ctx);

        let new_payload = bloark_storage::payload_path(out_dir.path(), Base(0));
        let contents = fs::read_to_string(&new_payload).expect("read");
        assert!(contents.contains("\"n\":1"));
        assert!(!contents.contains("\"n\":2"), "panicking record was dropped");
        assert!(contents.contains("\"n\":3"), "later record in the segment still ran");
    }

    #[tokio::test]
    async fn unmatched_metadata_sidecar_is_skipped_not_an_error() {
        let src_dir = tempdir().expect("tempdir");
        let orphan = src_dir.path().join("warehouse_00000.jsonl.zst");
        fs::write(&orphan, b"not a real archive").expect("write");

        let out_dir = tempdir().expect("tempdir");
        let mut modifier = Modifier::new(out_dir.path());
        modifier.preload(&orphan).expect("preload");
        let report = modifier.start().await.expect("start");
        assert_eq!(report.warehouses_processed, 0);
    }
