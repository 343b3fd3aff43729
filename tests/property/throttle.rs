//! Property tests for the reconnect throttle.
//!
//! Invariants tested:
//! - Granted reconnects are at least min_reconnect_interval apart
//! - last_reconnect never moves backwards
//! - Any success closes the failure window
//! - The phase is Exhausted exactly when the window has been open too long

use kv_resilience_core::{Clock, ManualClock};
use kv_resilience_reconnect::{ReconnectConfig, ReconnectThrottle, ThrottlePhase};
use proptest::prelude::*;
use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_secs(30);
const WINDOW: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
enum Step {
    Advance(u64),
    Failure { reconnect_ok: bool },
    Success,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u64..120).prop_map(Step::Advance),
        any::<bool>().prop_map(|reconnect_ok| Step::Failure { reconnect_ok }),
        Just(Step::Success),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn throttle_invariants_hold(steps in prop::collection::vec(step(), 1..100)) {
        let clock = ManualClock::new();
        let throttle = ReconnectThrottle::new(
            ReconnectConfig::builder()
                .clock(clock.clone())
                .min_reconnect_interval(INTERVAL)
                .max_failure_window(WINDOW)
                .build(),
        );

        let mut granted: Vec<Instant> = Vec::new();
        let mut last_reconnect = throttle.snapshot().last_reconnect;

        for step in steps {
            match step {
                Step::Advance(secs) => clock.advance(Duration::from_secs(secs)),
                Step::Failure { reconnect_ok } => {
                    let result = throttle.decide(|| {
                        if reconnect_ok { Ok(()) } else { Err("refused") }
                    });
                    if result.is_ok() {
                        granted.push(clock.now());
                    }
                }
                Step::Success => {
                    throttle.record_success();
                    prop_assert_eq!(throttle.snapshot().first_failure, None);
                    prop_assert_eq!(throttle.phase(), ThrottlePhase::Stable);
                }
            }

            let snapshot = throttle.snapshot();
            prop_assert!(snapshot.last_reconnect >= last_reconnect);
            last_reconnect = snapshot.last_reconnect;

            let exhausted = snapshot
                .first_failure
                .map(|start| clock.now().duration_since(start) >= WINDOW)
                .unwrap_or(false);
            prop_assert_eq!(snapshot.phase == ThrottlePhase::Exhausted, exhausted);
        }

        for pair in granted.windows(2) {
            prop_assert!(pair[1].duration_since(pair[0]) >= INTERVAL);
        }
        prop_assert_eq!(throttle.snapshot().reconnects, granted.len() as u64);
    }
}
