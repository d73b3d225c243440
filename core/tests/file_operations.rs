//! End-to-end tests of `SmbFileOperations` against an in-memory share.

mod common;

use std::io::{Cursor, Seek, SeekFrom, Write};

use common::{operations, pattern, server, SHARE};
use smbridge_core::config::StoreDisposition;
use smbridge_core::errors::FileError;
use smbridge_core::files::copy::MAX_BUFFER_SIZE;
use smbridge_core::files::smb::STORE_BUFFER_SIZE;
use smbridge_core::files::{FileOperations, SmbFileOperations, WorkItem};

fn store_and_read_back(len: usize) {
    let server = server();
    let mut ops = operations(&server);
    let data = pattern(len);

    let mut item = WorkItem::with_stream("blob.bin", Cursor::new(data.clone()));
    assert!(ops.store_file("blob.bin", &mut item).unwrap());

    let mut back = WorkItem::new("blob.bin");
    ops.retrieve_file("blob.bin", &mut back).unwrap();
    let read = back.buffer().unwrap().contents();
    assert_eq!(read.len(), len, "length mismatch for {len} bytes");
    assert!(read == data, "content mismatch for {len} bytes");
}

#[test]
fn store_round_trip_empty() {
    store_and_read_back(0);
}

#[test]
fn store_round_trip_smaller_than_buffer() {
    store_and_read_back(1000);
}

#[test]
fn store_round_trip_multiple_buffer_fills() {
    store_and_read_back(2 * STORE_BUFFER_SIZE + 12_345);
}

#[test]
fn retrieve_larger_than_copy_buffer() {
    let server = server();
    let data = pattern(3 * MAX_BUFFER_SIZE + 7);
    server.put_file(SHARE, "big/archive.bin", &data);
    let mut ops = operations(&server);

    let mut item = WorkItem::new("archive.bin");
    ops.retrieve_file(&format!("{SHARE}/big/archive.bin"), &mut item)
        .unwrap();

    assert!(item.buffer().unwrap().contents() == data);
}

#[test]
fn retrieve_nonexistent_names_path() {
    let server = server();
    let mut ops = operations(&server);
    let mut item = WorkItem::new("missing.csv");

    let err = ops.retrieve_file("in/missing.csv", &mut item).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("in/missing.csv"), "message: {message}");
    assert!(matches!(err, FileError::OperationFailed { .. }));
}

#[test]
fn retrieve_failure_mid_stream_is_signaled() {
    let server = server();
    server.put_file(SHARE, "flaky.bin", &pattern(10_000));
    server.fail_reads_of("flaky.bin");
    let mut ops = operations(&server);
    let mut item = WorkItem::new("flaky.bin");

    let err = ops.retrieve_file("flaky.bin", &mut item).unwrap_err();

    assert!(err.to_string().contains("connection reset"));
    // The buffer was attached before the copy started.
    assert!(item.buffer().is_some());
}

#[test]
fn list_files_reports_entries_without_markers() {
    let server = server();
    server.put_file_modified(SHARE, "inbox/a.txt", b"0123456789", 1_650_000_000_000);
    server.create_dir_all(SHARE, "inbox/sub");
    let mut ops = operations(&server);

    let mut entries = ops.list_files("inbox").unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "sub"]);
    assert!(!entries[0].is_directory);
    assert_eq!(entries[0].size, 10);
    assert_eq!(entries[0].last_modified, 1_650_000_000_000);
    assert!(entries[1].is_directory);
}

#[test]
fn list_root_of_share() {
    let server = server();
    server.put_file(SHARE, "top.txt", b"x");
    let mut ops = operations(&server);

    let entries = ops.list_files(SHARE).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "top.txt");
}

#[test]
fn build_directory_is_ordered_and_idempotent() {
    let server = server();
    let mut ops = operations(&server);

    assert!(ops.build_directory("a/b/c", true).unwrap());
    assert_eq!(server.mkdir_log(), vec!["a", "a\\b", "a\\b\\c"]);

    assert!(ops.build_directory("a/b/c", true).unwrap());
    assert_eq!(server.mkdir_log().len(), 3);
}

#[test]
fn build_then_store_into_base_path() {
    let server = server();
    let mut endpoint = common::endpoint();
    endpoint.path = "outgoing/orders".to_string();
    let mut ops = SmbFileOperations::with_endpoint(server.clone(), endpoint).unwrap();

    ops.build_directory(&format!("{SHARE}/outgoing/orders/2024"), false)
        .unwrap();
    let mut item = WorkItem::with_stream("2024/order-1.xml", Cursor::new(b"<o/>".to_vec()));
    ops.store_file("2024/order-1.xml", &mut item).unwrap();

    assert!(ops.exists_file("outgoing/orders/2024/order-1.xml").unwrap());
    assert_eq!(
        server.file_contents(SHARE, "outgoing/orders/2024/order-1.xml").unwrap(),
        b"<o/>"
    );
}

#[test]
fn store_into_missing_directory_fails() {
    let server = server();
    let mut ops = operations(&server);
    let mut item = WorkItem::with_stream("nope/a.txt", Cursor::new(b"x".to_vec()));

    let err = ops.store_file("nope/a.txt", &mut item).unwrap_err();

    assert!(err.to_string().contains("//fileserver/exchange/nope/a.txt"));
}

#[test]
fn store_from_local_file() {
    let server = server();
    let mut staged = tempfile::tempfile().unwrap();
    let data = pattern(100_000);
    staged.write_all(&data).unwrap();
    staged.seek(SeekFrom::Start(0)).unwrap();

    let mut ops = operations(&server);
    let mut item = WorkItem::with_stream("staged.bin", staged);
    ops.store_file("staged.bin", &mut item).unwrap();

    assert!(server.file_contents(SHARE, "staged.bin").unwrap() == data);
}

#[test]
fn overwrite_disposition_from_settings() {
    let server = server();
    server.put_file(SHARE, "report.txt", b"v1");
    let mut settings = common::settings();
    settings["storeDisposition"] = serde_json::json!("overwrite");
    let endpoint = smbridge_core::config::SmbConfig::from_settings(settings).unwrap();
    assert_eq!(endpoint.store_disposition, StoreDisposition::Overwrite);
    let mut ops = SmbFileOperations::with_endpoint(server.clone(), endpoint).unwrap();

    let mut item = WorkItem::with_stream("report.txt", Cursor::new(b"v2".to_vec()));
    ops.store_file("report.txt", &mut item).unwrap();

    assert_eq!(server.file_contents(SHARE, "report.txt").unwrap(), b"v2");
}

#[test]
fn one_session_for_many_operations() {
    let server = server();
    server.put_file(SHARE, "a.txt", b"a");
    let mut ops = operations(&server);

    ops.exists_file("a.txt").unwrap();
    ops.list_files("").unwrap();
    let mut item = WorkItem::new("a.txt");
    ops.retrieve_file("a.txt", &mut item).unwrap();
    let mut item = WorkItem::with_stream("b.txt", Cursor::new(b"b".to_vec()));
    ops.store_file("b.txt", &mut item).unwrap();

    assert_eq!(server.connect_count(), 1);
    drop(ops);
    assert_eq!(server.logoff_count(), 1);
}

#[test]
fn unreachable_host_is_session_unavailable() {
    let server = server();
    server.set_reachable(false);
    let mut ops = operations(&server);

    let err = ops.list_files("").unwrap_err();

    assert!(matches!(err, FileError::SessionUnavailable(_)));
    assert!(err.to_string().contains("fileserver"));

    server.set_reachable(true);
    assert!(ops.list_files("").is_ok());
}
