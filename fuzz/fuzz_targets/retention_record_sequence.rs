#![no_main]

use libfuzzer_sys::fuzz_target;
use roompulse_core::config::RetentionConfig;
use roompulse_core::retention::{RecordOutcome, RetentionEngine};
use roompulse_core::status::StatusValue;

fn config_from(header: [u8; 4]) -> RetentionConfig {
    let [dense_raw, window_raw, sparse_raw, max_raw] = header;
    let dense = i64::from(dense_raw % 10) + 1;
    RetentionConfig {
        dense_snapshot_interval_secs: dense,
        dense_interval_window_secs: dense + i64::from(window_raw % 60),
        sparse_snapshot_interval_secs: dense + i64::from(sparse_raw % 60),
        max_snapshot_count: usize::from(max_raw % 64) + 1,
    }
}

/// Up to eight statuses packed two bits each.
fn statuses_from(bits: u16, len_raw: u8) -> impl Iterator<Item = StatusValue> {
    (0..usize::from(len_raw % 9)).map(move |i| StatusValue::ALL[usize::from((bits >> (i * 2)) & 0b11)])
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 || data.len() > 65_536 {
        return;
    }

    let config = config_from([data[0], data[1], data[2], data[3]]);
    let Ok(mut engine) = RetentionEngine::new(config) else {
        panic!("generated config should be valid: {config:?}");
    };

    let mut now_ms: i64 = 0;
    for chunk in data[4..].chunks(5) {
        let [step_tag, step_hi, step_lo, bits_hi, bits_lo] = match chunk {
            [a, b, c, d, e] => [*a, *b, *c, *d, *e],
            _ => break,
        };

        let magnitude = i64::from(u16::from_be_bytes([step_hi, step_lo]));
        now_ms = match step_tag % 8 {
            // Occasional backwards step.
            0 => now_ms.saturating_sub(magnitude),
            // Occasional long gap.
            1 => now_ms.saturating_add(magnitude * 100),
            _ => now_ms.saturating_add(magnitude),
        };

        let before = engine.to_vec();
        let bits = u16::from_be_bytes([bits_hi, bits_lo]);
        let expected_total = u64::from(step_tag % 9);
        let outcome = engine.record(statuses_from(bits, step_tag), now_ms);

        match outcome {
            RecordOutcome::Throttled { since_last_ms } => {
                assert!(since_last_ms < config.dense_interval_ms());
                assert_eq!(engine.to_vec(), before, "throttled call mutated history");
            }
            RecordOutcome::Recorded(report) => {
                let latest = engine.latest().expect("recorded snapshot present");
                assert_eq!(latest.timestamp_ms, now_ms);
                assert_eq!(latest.total(), expected_total);
                assert_eq!(report.timestamp_ms, now_ms);

                let cutoff = now_ms - config.dense_window_ms();
                assert!(engine.dense().all(|s| s.timestamp_ms >= cutoff));
            }
        }

        assert!(engine.len() <= config.max_snapshot_count);

        let history: Vec<i64> = engine.history().map(|s| s.timestamp_ms).collect();
        assert!(
            history.windows(2).all(|w| w[0] <= w[1]),
            "history out of order: {history:?}"
        );

        let sparse: Vec<i64> = engine.sparse().map(|s| s.timestamp_ms).collect();
        assert!(
            sparse
                .windows(2)
                .all(|w| w[1] - w[0] >= config.sparse_interval_ms()),
            "sparse spacing violated: {sparse:?}"
        );
    }
});
