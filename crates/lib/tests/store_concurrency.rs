//! Concurrency tests for the record store.
//!
//! These exercise the store from many threads at once: readers racing a
//! writer, writers contending on one collection, and writers on separate
//! collections proceeding independently.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Barrier, mpsc};
use std::thread;
use std::time::Duration;

use rocketblend_lib::store::Store;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Blob {
  generation: String,
  payload: String,
}

fn blob(generation: &str, fill: char) -> Blob {
  Blob {
    generation: generation.to_string(),
    payload: std::iter::repeat_n(fill, 256 * 1024).collect(),
  }
}

fn test_store() -> (Store, TempDir) {
  let temp = TempDir::new().unwrap();
  let store = Store::open(temp.path()).unwrap();
  (store, temp)
}

#[test]
fn readers_never_observe_partial_writes() {
  const READERS: usize = 4;
  const WRITES: usize = 50;

  let (store, _temp) = test_store();
  let old = blob("old", 'a');
  let new = blob("new", 'b');
  store.write("installs", "blender", &old).unwrap();

  let done = AtomicBool::new(false);
  let reads = AtomicUsize::new(0);

  thread::scope(|s| {
    for _ in 0..READERS {
      s.spawn(|| {
        loop {
          let finished = done.load(Ordering::Acquire);
          let seen: Blob = store.read("installs", "blender").unwrap();
          assert!(seen == old || seen == new, "read a mixed record: {}", seen.generation);
          reads.fetch_add(1, Ordering::Relaxed);
          if finished {
            break;
          }
        }
      });
    }

    s.spawn(|| {
      for i in 0..WRITES {
        let next = if i % 2 == 0 { &new } else { &old };
        store.write("installs", "blender", next).unwrap();
      }
      done.store(true, Ordering::Release);
    });
  });

  assert!(reads.load(Ordering::Relaxed) > 0);
}

#[test]
fn concurrent_updates_to_one_record_lose_nothing() {
  const WRITERS: usize = 16;

  let (store, _temp) = test_store();
  let active = AtomicUsize::new(0);
  let max_active = AtomicUsize::new(0);
  let barrier = Barrier::new(WRITERS);

  thread::scope(|s| {
    for i in 0..WRITERS {
      let (store, active, max_active, barrier) = (&store, &active, &max_active, &barrier);
      s.spawn(move || {
        barrier.wait();
        store
          .update("log", "markers", |current: Option<Vec<String>>| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_active.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));

            let mut markers = current.unwrap_or_default();
            markers.push(format!("writer-{i}"));

            active.fetch_sub(1, Ordering::SeqCst);
            markers
          })
          .unwrap();
      });
    }
  });

  let markers: Vec<String> = store.read("log", "markers").unwrap();
  let unique: HashSet<_> = markers.iter().collect();
  assert_eq!(markers.len(), WRITERS);
  assert_eq!(unique.len(), WRITERS);
  assert_eq!(max_active.load(Ordering::SeqCst), 1, "two writers held the collection lock at once");
}

#[test]
fn concurrent_writes_to_one_collection_all_land() {
  const WRITERS: usize = 16;

  let (store, _temp) = test_store();
  let barrier = Barrier::new(WRITERS);

  thread::scope(|s| {
    for i in 0..WRITERS {
      let (store, barrier) = (&store, &barrier);
      s.spawn(move || {
        barrier.wait();
        store
          .write("installs", &format!("blender-{i}"), &serde_json::json!({ "marker": i }))
          .unwrap();
      });
    }
  });

  let records = store.read_all("installs").unwrap();
  let markers: HashSet<u64> = records
    .iter()
    .map(|r| r.value["marker"].as_u64().unwrap())
    .collect();
  assert_eq!(records.len(), WRITERS);
  assert_eq!(markers, (0..WRITERS as u64).collect());
}

#[test]
fn collections_do_not_block_each_other() {
  let (store, _temp) = test_store();
  let store = &store;
  let (entered_tx, entered_rx) = mpsc::channel();
  let (written_tx, written_rx) = mpsc::channel();

  thread::scope(|s| {
    let holder = s.spawn(move || {
      store
        .update("installs", "slow", |_: Option<u32>| {
          entered_tx.send(()).unwrap();
          // Still holding the "installs" lock here.
          u32::from(written_rx.recv_timeout(Duration::from_secs(10)).is_ok())
        })
        .unwrap()
    });

    s.spawn(move || {
      entered_rx.recv().unwrap();
      store.write("remotes", "fast", &1u32).unwrap();
      written_tx.send(()).unwrap();
    });

    assert_eq!(holder.join().unwrap(), 1, "write to another collection was blocked");
  });
}

#[test]
fn same_collection_writer_waits_for_holder() {
  let (store, _temp) = test_store();
  let store = &store;
  let released = &AtomicBool::new(false);
  let (entered_tx, entered_rx) = mpsc::channel();

  thread::scope(|s| {
    s.spawn(move || {
      store
        .update("installs", "first", |_: Option<u32>| {
          entered_tx.send(()).unwrap();
          thread::sleep(Duration::from_millis(50));
          released.store(true, Ordering::SeqCst);
          1
        })
        .unwrap();
    });

    s.spawn(move || {
      entered_rx.recv().unwrap();
      store.write("installs", "second", &2u32).unwrap();
      assert!(released.load(Ordering::SeqCst), "write ran while the collection was locked");
    });
  });
}
