//! Deprecated fields warn through the `log` facade when assigned.
//!
//! This binary installs its own capturing logger, so it holds a single test.

mod common;

use std::sync::Mutex;

use cfgtree::Value;
use common::fixtures;
use log::{Level, LevelFilter, Log, Metadata, Record};

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct Capture;

impl Log for Capture {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn warnings() -> Vec<String> {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, message)| message.clone())
        .collect()
}

#[test]
fn test_deprecated_field() {
    log::set_logger(&Capture).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let fx = fixtures();
    let mut config = fx.deprecation.instantiate().unwrap();
    assert!(warnings().is_empty(), "defaults do not warn");
    assert_eq!(config.field("old").unwrap().deprecated(), Some("not used!"));
    assert_eq!(config.field("old").unwrap().doc(), "Something. Deprecated: not used!");

    config.set("old", 11).unwrap();
    assert_eq!(warnings(), vec!["Config field old is deprecated: not used!"]);

    // Deprecated fields at their default are left out of to_dict and saves.
    let fresh = fx.deprecation.instantiate().unwrap();
    assert!(fresh.to_dict().is_empty());
    assert_eq!(config.to_dict()["old"], Value::Int(11));

    config.load_from_str("config.old = 12\n").unwrap();
    assert_eq!(warnings().len(), 2);
    // The saved comment carries the deprecation note from the field doc.
    assert_eq!(
        config.save_to_string().unwrap(),
        "# Something. Deprecated: not used!\nconfig.old=12\n"
    );

    // Loading and saving also leave debug traces.
    let records = RECORDS.lock().unwrap();
    assert!(records
        .iter()
        .any(|(level, message)| *level == Level::Debug && message.contains("loading 1 statements")));
}
