use procpipe::{SIGNAL_NAMES, signals};

#[test]
fn every_registry_name_is_known() {
    let table = signals();
    for name in SIGNAL_NAMES {
        assert!(table.is_known(name), "{name} missing from the registry");
    }
    assert!(!table.is_known("SIGNOTATHING"));
    assert_eq!(table.value("SIGNOTATHING"), None);
}

#[cfg(unix)]
#[test]
fn posix_platform_resolves_core_signals() {
    let table = signals();
    assert_eq!(table.value("SIGTERM"), Some(15));
    assert_eq!(table.value("SIGKILL"), Some(9));
    assert_eq!(table.value("SIGINT"), Some(2));
    assert!(table.supported().count() > 10);
}

#[cfg(windows)]
#[test]
fn windows_platform_marks_all_signals_absent() {
    let table = signals();
    for name in SIGNAL_NAMES {
        assert_eq!(table.value(name), None);
    }
    assert_eq!(table.supported().count(), 0);
}
