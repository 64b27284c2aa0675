use std::io::Write;

use tickpool_source::{load_script, Command, Corpus, ScriptError, ScriptEvent, SimConfig, SourceError, WorkerLabel};

#[test]
fn loads_script_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0 C1 S").unwrap();
    writeln!(file, "2 C2 S").unwrap();
    writeln!(file, "oops").unwrap();
    writeln!(file, "5 C1 T").unwrap();
    writeln!(file, "6 EXIT").unwrap();

    let events = load_script(file.path()).unwrap();
    assert_eq!(events.len(), 5);
    assert_eq!(
        events[0],
        Ok(ScriptEvent::Command { at: 0, label: WorkerLabel(1), command: Command::Spawn })
    );
    assert!(matches!(events[2], Err(ScriptError::InvalidFormat { line: 3, .. })));
    assert_eq!(events[4], Ok(ScriptEvent::Exit { at: 6 }));
}

#[test]
fn loads_corpus_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "first line\nsecond line\r\nthird line\n").unwrap();

    let corpus = Corpus::load(file.path()).unwrap();
    assert_eq!(corpus.lines(), &["first line", "second line", "third line"]);
}

#[test]
fn missing_files_report_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");

    match Corpus::load(&missing) {
        Err(SourceError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected an io error, got {:?}", other),
    }
    assert!(matches!(load_script(&missing), Err(SourceError::Io { .. })));
}

#[test]
fn loads_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "max_workers = 3\ntick_millis = 0\n").unwrap();

    let config = SimConfig::load(file.path()).unwrap();
    assert_eq!(config.max_workers, 3);
    assert_eq!(config.tick_millis, 0);
    assert!(config.validate().is_ok());
}

#[test]
fn malformed_config_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "max_workers = \"many\"\n").unwrap();

    assert!(matches!(SimConfig::load(file.path()), Err(SourceError::Config(_))));
}
