//! Async `ShareFileBrowser` tests, including concurrent use of one adapter.

mod common;

use common::{operations, pattern, server, SHARE};
use smbridge_core::files::{FileBrowser, ShareFileBrowser};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_share_one_session() {
    let server = server();
    server.create_dir_all(SHARE, "parallel");
    let browser = ShareFileBrowser::new(operations(&server));

    let mut handles = Vec::new();
    for i in 0..16 {
        let browser = browser.clone();
        handles.push(tokio::spawn(async move {
            let path = format!("parallel/file-{i}.bin");
            let data = pattern(1000 + i);
            browser.write_file(&path, &data).await.unwrap();
            let read = browser.read_file(&path).await.unwrap();
            assert!(read == data, "mismatch in {path}");
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(server.connect_count(), 1);
    assert_eq!(browser.list_dir("parallel").await.unwrap().len(), 16);
}

#[tokio::test]
async fn boxed_browser_round_trip() {
    let server = server();
    let browser: Box<dyn FileBrowser> = Box::new(ShareFileBrowser::new(operations(&server)));

    browser.create_dir_all("exchange/in/2024").await.unwrap();
    browser.write_file("in/2024/data.json", b"{}").await.unwrap();

    assert!(browser.exists("in/2024/data.json").await.unwrap());
    assert!(!browser.exists("in/2024/other.json").await.unwrap());
    assert_eq!(browser.read_file("in/2024/data.json").await.unwrap(), b"{}");
}

#[tokio::test]
async fn close_then_reconnect() {
    let server = server();
    let browser = ShareFileBrowser::new(operations(&server));

    browser.list_dir("").await.unwrap();
    browser.close().await.unwrap();
    browser.list_dir("").await.unwrap();

    assert_eq!(server.connect_count(), 2);
    assert_eq!(server.logoff_count(), 1);
}
