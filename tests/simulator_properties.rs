use proptest::prelude::*;

use solar_storage_sim::sim::battery::final_state_wh;
use solar_storage_sim::sim::{BatteryConfig, FirstInterval, simulate, simulate_with};

fn net_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-50_000.0..50_000.0_f64, 0..400)
}

proptest! {
    #[test]
    fn states_stay_within_capacity(
        net in net_series(),
        capacity in 1.0..1_000_000.0_f64,
        percent in 0.0..=100.0_f64,
    ) {
        let t = simulate(&net, capacity, percent).unwrap();
        prop_assert_eq!(t.len(), net.len());
        for p in &t.points {
            prop_assert!(p.state_wh >= 0.0 && p.state_wh <= capacity);
            prop_assert!(p.state_percent >= 0.0 && p.state_percent <= 100.0);
            prop_assert!(p.export_wh >= 0.0 && p.import_wh >= 0.0);
        }
    }

    #[test]
    fn repeated_runs_are_identical(
        net in net_series(),
        capacity in 1.0..1_000_000.0_f64,
        percent in 0.0..=100.0_f64,
    ) {
        let a = simulate(&net, capacity, percent).unwrap();
        let b = simulate(&net, capacity, percent).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn clipped_energy_balances(
        net in net_series(),
        capacity in 1.0..1_000_000.0_f64,
        percent in 0.0..=100.0_f64,
    ) {
        let t = simulate(&net, capacity, percent).unwrap();
        let seed = capacity * percent / 100.0;
        let expected = seed + net.iter().sum::<f64>() - t.total_export_wh() + t.total_import_wh();
        let scale = 1.0 + capacity + net.iter().map(|v| v.abs()).sum::<f64>();
        prop_assert!((t.final_state_wh() - expected).abs() <= 1e-9 * scale);
    }

    #[test]
    fn streamed_final_state_matches_trajectory(
        net in net_series(),
        capacity in 1.0..1_000_000.0_f64,
        percent in 0.0..=100.0_f64,
        hold in any::<bool>(),
    ) {
        let policy = if hold { FirstInterval::Hold } else { FirstInterval::Apply };
        let cfg = BatteryConfig::new(capacity, percent).unwrap().with_first_interval(policy);
        let t = simulate_with(&net, &cfg).unwrap();
        prop_assert_eq!(final_state_wh(&net, &cfg).unwrap(), t.final_state_wh());
    }
}
