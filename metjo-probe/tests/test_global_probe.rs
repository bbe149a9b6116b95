//! Process-wide probes as emitted by the instrumenter.
//!
//! A dispatcher can be installed once per process, so everything that needs
//! the installed dispatcher lives in a single test.

use metjo_probe::{
    init, installed, probe_entry, ProbeArg, ProbeDispatcher, ProbeError, ProfilerConfig,
    RegistrySnapshot,
};

fn compute(label: &str, amount: u32, verbose: bool) -> u32 {
    let __metjo_guard = metjo_probe::probe_entry(
        "shop::Service::compute",
        "shop::Service::compute",
        &[ProbeArg::Opaque, ProbeArg::from(amount), ProbeArg::Opaque],
        true,
    );
    if verbose {
        println!("{label}");
    }
    amount * 2
}

fn parse_quantity(raw: &str) -> Result<u32, std::num::ParseIntError> {
    let __metjo_guard = metjo_probe::probe_entry("shop::parse_quantity", "shop::parse_quantity", &[], false);
    let value = raw.trim().parse::<u32>()?;
    Ok(value)
}

fn early_return(flag: bool) -> u8 {
    let __metjo_guard = metjo_probe::probe_entry("shop::early_return", "shop::early_return", &[], false);
    if flag {
        return 1;
    }
    0
}

fn explode() {
    let __metjo_guard = metjo_probe::probe_entry("shop::explode", "shop::explode", &[], false);
    panic!("boom");
}

fn fib(n: u64) -> u64 {
    let __metjo_guard = metjo_probe::probe_entry("fib", "shop::fib", &[ProbeArg::from(n)], true);
    if n < 2 {
        n
    } else {
        fib(n - 1) + fib(n - 2)
    }
}

#[metjo_probe::timed(relative)]
fn marked(x: i32) -> i32 {
    x + 1
}

fn timer_count(snapshot: &RegistrySnapshot, name: &str) -> u64 {
    snapshot.timers.iter().find(|t| t.name == name).map_or(0, |t| t.count)
}

#[test]
fn test_installed_probes_follow_every_exit_path() {
    // Inert until installed.
    assert!(installed().is_none());
    assert!(!probe_entry("shop::idle", "shop::idle", &[], false).is_armed());
    assert_eq!(compute("x", 21, false), 42);

    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("metrics.json");
    let config = ProfilerConfig::from_yaml(&format!(
        r#"
reporter: json
properties:
  path: "{}"
  period: 3600
parameters:
  - {{ name: amount, parameter: "shop::Service::compute.1" }}
  - {{ name: label, parameter: "shop::Service::compute.0" }}
  - {{ name: fib-n, parameter: "shop::fib.0" }}
"#,
        snapshot_path.display()
    ))
    .unwrap();
    let handle = init(&config).unwrap();
    assert!(handle.is_exporting());
    assert!(matches!(init(&config), Err(ProbeError::AlreadyInstalled)));

    assert_eq!(compute("x", 21, false), 42);
    assert_eq!(compute("y", 5, false), 10);
    assert_eq!(parse_quantity("7"), Ok(7));
    assert!(parse_quantity("seven").is_err());
    assert_eq!(early_return(true), 1);
    assert_eq!(early_return(false), 0);
    assert!(std::panic::catch_unwind(explode).is_err());
    assert_eq!(fib(10), 55);
    assert_eq!(marked(1), 2);
    assert_eq!(ProbeDispatcher::current_depth(), 0);

    let snapshot = handle.snapshot();
    assert_eq!(timer_count(&snapshot, "shop::Service::compute"), 2);
    assert_eq!(timer_count(&snapshot, "shop::parse_quantity"), 2);
    assert_eq!(timer_count(&snapshot, "shop::early_return"), 2);
    assert_eq!(timer_count(&snapshot, "shop::explode"), 1);
    assert_eq!(timer_count(&snapshot, "fib"), 177);

    let amount = snapshot.distributions.iter().find(|d| d.name == "amount").unwrap();
    assert_eq!((amount.count, amount.min, amount.max), (2, 5, 21));
    let label = snapshot.distributions.iter().find(|d| d.name == "label").unwrap();
    assert_eq!(label.count, 0);

    let stats = handle.dispatcher().stats();
    assert_eq!(stats.timers_started(), stats.timers_stopped());
    assert_eq!(stats.unmatched_exits(), 0);

    // Guards created before shutdown still exit cleanly afterwards.
    let straddling = probe_entry("shop::straddling", "shop::straddling", &[], false);
    assert!(straddling.is_armed());
    let dispatcher = std::sync::Arc::clone(handle.dispatcher());
    handle.shutdown();
    assert!(!probe_entry("shop::late", "shop::late", &[], false).is_armed());
    drop(straddling);
    assert_eq!(ProbeDispatcher::current_depth(), 0);
    assert_eq!(dispatcher.stats().unmatched_exits(), 0);

    let written: RegistrySnapshot =
        serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    assert_eq!(timer_count(&written, "shop::Service::compute"), 2);
}
