use metjo_probe::{init, probe_entry, ProfilerConfig};

#[test]
fn test_unknown_reporter_keeps_collecting() {
    let config = ProfilerConfig::from_yaml("reporter: wavefront\nproperties: { host: localhost }\n").unwrap();
    let handle = init(&config).unwrap();
    assert!(!handle.is_exporting());

    {
        let guard = probe_entry("app::tick", "app::tick", &[], false);
        assert!(guard.is_armed());
    }

    let tick = handle.registry().find_timer("app::tick").unwrap();
    assert_eq!(tick.count(), 1);
}
