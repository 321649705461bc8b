use super::*;
use crate::kernel::services::adapters::{FsOp, MemoryFs, MemoryRuntime};
use crate::models::{FileNode, FileTree};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Fails the first `failures` boots, then hands out memory filesystems.
struct FlakyBooter {
    attempts: AtomicUsize,
    failures: usize,
}

#[async_trait]
impl RuntimeBooter for FlakyBooter {
    async fn boot(&self) -> Result<Arc<dyn RuntimeFs>, RuntimeError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if attempt < self.failures {
            return Err(RuntimeError::Boot("sandbox refused to start".to_string()));
        }
        Ok(Arc::new(MemoryFs::new()))
    }
}

/// Blocks in `boot` until released.
struct GatedBooter {
    gate: Notify,
    booted: std::sync::Mutex<Option<Arc<MemoryFs>>>,
}

#[async_trait]
impl RuntimeBooter for GatedBooter {
    async fn boot(&self) -> Result<Arc<dyn RuntimeFs>, RuntimeError> {
        self.gate.notified().await;
        let fs = Arc::new(MemoryFs::new());
        *self.booted.lock().unwrap() = Some(Arc::clone(&fs));
        Ok(fs)
    }
}

fn memory_session() -> (Arc<MemoryRuntime>, RuntimeSession) {
    let booter = Arc::new(MemoryRuntime::new());
    let session = RuntimeSession::new(booter.clone());
    (booter, session)
}

#[tokio::test]
async fn test_concurrent_boots_share_one_instance() {
    let (booter, session) = memory_session();

    let (a, b) = tokio::join!(session.boot(), session.boot());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(booter.boot_count(), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(session.status().await, RuntimeStatus::Ready);

    session.boot().await.unwrap();
    assert_eq!(booter.boot_count(), 1);
}

#[tokio::test]
async fn test_boot_failure_reaches_every_waiter_and_allows_retry() {
    let booter = Arc::new(FlakyBooter {
        attempts: AtomicUsize::new(0),
        failures: 1,
    });
    let session = RuntimeSession::new(booter.clone());

    let (a, b) = tokio::join!(session.boot(), session.boot());
    assert!(matches!(a, Err(RuntimeError::Boot(_))));
    assert!(matches!(b, Err(RuntimeError::Boot(_))));
    assert_eq!(booter.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(session.status().await, RuntimeStatus::Idle);

    session.boot().await.unwrap();
    assert_eq!(booter.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(session.status().await, RuntimeStatus::Ready);
}

#[tokio::test]
async fn test_teardown_then_boot_creates_fresh_instance() {
    let (booter, session) = memory_session();
    session.boot().await.unwrap();
    let first = booter.current().unwrap();

    session.teardown().await;
    assert_eq!(session.status().await, RuntimeStatus::Idle);
    assert!(first.is_torn_down());
    assert!(session.running().await.is_none());

    session.boot().await.unwrap();
    let second = booter.current().unwrap();
    assert_eq!(booter.boot_count(), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.is_torn_down());
}

#[tokio::test]
async fn test_teardown_during_boot_releases_late_instance() {
    let booter = Arc::new(GatedBooter {
        gate: Notify::new(),
        booted: std::sync::Mutex::new(None),
    });
    let session = Arc::new(RuntimeSession::new(booter.clone()));

    let task = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.boot().await })
    };
    while session.status().await != RuntimeStatus::Booting {
        tokio::task::yield_now().await;
    }

    session.teardown().await;
    booter.gate.notify_one();

    let outcome = task.await.unwrap();
    assert!(matches!(outcome, Err(RuntimeError::Unavailable)));
    assert_eq!(session.status().await, RuntimeStatus::Idle);
    let late = booter.booted.lock().unwrap().clone().unwrap();
    assert!(late.is_torn_down());
}

#[tokio::test]
async fn test_write_before_boot_is_unavailable() {
    let (booter, session) = memory_session();
    let err = session.write_file("index.js", "x").await.unwrap_err();
    assert_eq!(err, RuntimeError::Unavailable);
    assert_eq!(booter.boot_count(), 0);
}

#[tokio::test]
async fn test_write_creates_parent_then_writes() {
    let (booter, session) = memory_session();
    session.boot().await.unwrap();

    session.write_file("app/page.tsx", "B").await.unwrap();

    let fs = booter.current().unwrap();
    assert_eq!(
        fs.ops(),
        vec![
            FsOp::Mkdir {
                path: "app".to_string(),
                recursive: true
            },
            FsOp::WriteFile {
                path: "app/page.tsx".to_string(),
                content: "B".to_string()
            },
        ]
    );
    assert_eq!(fs.read("app/page.tsx").as_deref(), Some("B"));
}

#[tokio::test]
async fn test_top_level_write_skips_mkdir() {
    let (booter, session) = memory_session();
    session.boot().await.unwrap();

    session.write_file("index.html", "<p/>").await.unwrap();

    let ops = booter.current().unwrap().ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], FsOp::WriteFile { path, .. } if path == "index.html"));
}

#[tokio::test]
async fn test_concurrent_writes_do_not_interleave() {
    let (booter, session) = memory_session();
    session.boot().await.unwrap();

    let (a, b) = tokio::join!(
        session.write_file("src/a.js", "a"),
        session.write_file("src/lib/b.js", "b")
    );
    a.unwrap();
    b.unwrap();

    let ops = booter.current().unwrap().ops();
    assert_eq!(ops.len(), 4);
    for pair in ops.chunks(2) {
        match pair {
            [FsOp::Mkdir { path: dir, .. }, FsOp::WriteFile { path, .. }] => {
                assert!(path.starts_with(dir.as_str()), "{dir} / {path}");
            }
            other => panic!("interleaved ops: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_mount_tree_writes_every_file_in_order() {
    let mut tree = FileTree::new("root");
    tree.add_file("", FileNode::new("package", "json", "{}")).unwrap();
    tree.add_folder("", "src").unwrap();
    tree.add_file("src", FileNode::new("index", "js", "main()")).unwrap();

    let (booter, session) = memory_session();
    session.boot().await.unwrap();
    let written = session.mount_tree(&tree).await.unwrap();

    assert_eq!(written, 2);
    let fs = booter.current().unwrap();
    assert_eq!(fs.read("package.json").as_deref(), Some("{}"));
    assert_eq!(fs.read("src/index.js").as_deref(), Some("main()"));
    assert!(fs.has_dir("src"));
}
