    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn list_files_is_sorted_deduplicated_and_skips_dotfiles() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("sub")).expect("mkdir");
        File::create(dir.path().join("b.xml")).expect("create");
        File::create(dir.path().join("a.xml")).expect("create");
        File::create(dir.path().join(".hidden.xml")).expect("create");
        File::create(dir.path().join("sub/c.xml")).expect("create");

        let first = list_files(dir.path(), Some(&["xml"])).expect("list");
        let second = list_files(dir.path(), Some(&["xml"])).expect("list");
        assert_eq!(first, second, "deterministic enumeration");
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn list_files_filters_by_extension() {
        let dir = tempdir().expect("tempdir");
        File::create(dir.path().join("a.xml")).expect("create");
        File::create(dir.path().join("a.7z")).expect("create");
        let xml_only = list_files(dir.path(), Some(&["xml"])).expect("list");
        assert_eq!(xml_only, vec![dir.path().join("a.xml")]);
    }

    #[test]
    fn prepare_output_dir_recreates_empty() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("out");
        fs::create_dir_all(&target).expect("mkdir");
        File::create(target.join("stale.txt")).expect("create");

        prepare_output_dir(&target).expect("prepare");
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).expect("read_dir").count(), 0);
    }

    #[test]
    fn cleanup_dir_reports_but_does_not_abort() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("gone");
        let mut errors = Vec::new();
        cleanup_dir(&target, |path, _err| errors.push(path.to_path_buf()));
        assert!(errors.is_empty(), "missing dir is not an error");
    }

    #[test]
    fn line_offsets_finds_non_empty_line_starts() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("lines.jsonl");
        let mut file = File::create(&path).expect("create");
        write!(file, "{{\"a\":1}}\n\n{{\"a\":2}}\n").expect("write");

        let offsets = line_offsets(&path).expect("offsets");
        assert_eq!(offsets, vec![0, 10]);
        assert_eq!(read_line_at(&path, offsets[1]).expect("read"), r#"{"a":2}"#);
    }
