#![allow(clippy::float_cmp)]

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use mulenet_core::Transaction;
use mulenet_detect::context::{Pattern, PatternType, RunContext};
use mulenet_detect::detect::cycles::canonicalize_cycle;
use mulenet_detect::detect::{CycleDetector, Detector, temporal_concentration};
use mulenet_detect::{TransactionGraph, analyze};
use proptest::prelude::*;

const ACCOUNTS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 0.0f64..5_000.0, 0i64..10_000).prop_map(
        |(from, to, amount, minute)| {
            let base = Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .expect("valid timestamp");
            Transaction::new(
                "t",
                ACCOUNTS[from],
                ACCOUNTS[to],
                amount,
                base + Duration::minutes(minute),
            )
        },
    )
}

fn arb_records() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(arb_transaction(), 0..48)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn scores_stay_in_range(records in arb_records()) {
        let report = analyze(&records);
        for account in &report.suspicious_accounts {
            prop_assert!((0.0..=100.0).contains(&account.suspicion_score));
        }
        for ring in &report.fraud_rings {
            prop_assert!((0.0..=100.0).contains(&ring.risk_score));
        }
        for node in &report.graph.nodes {
            prop_assert!((0.0..=100.0).contains(&node.score));
        }
    }

    #[test]
    fn surviving_rings_are_disjoint(records in arb_records()) {
        let report = analyze(&records);
        let mut seen = HashSet::new();
        for ring in &report.fraud_rings {
            prop_assert!(ring.member_accounts.len() >= 2);
            if ring.pattern_type == PatternType::Cycle {
                prop_assert!(ring.member_accounts.len() <= 5);
            }
            for member in &ring.member_accounts {
                prop_assert!(seen.insert(member.clone()), "{} claimed twice", member);
            }
        }
    }

    #[test]
    fn reported_accounts_belong_to_their_ring(records in arb_records()) {
        let report = analyze(&records);
        prop_assert_eq!(report.summary.suspicious_accounts_flagged, report.suspicious_accounts.len());
        for account in &report.suspicious_accounts {
            let ring = report.ring(&account.ring_id);
            prop_assert!(ring.is_some());
            prop_assert!(ring.is_some_and(|r| r.member_accounts.contains(&account.account_id)));
        }
        for pair in report.suspicious_accounts.windows(2) {
            prop_assert!(pair[0].suspicion_score >= pair[1].suspicion_score);
        }
    }

    #[test]
    fn cycle_flags_name_lengths_three_to_five(records in arb_records()) {
        let graph = TransactionGraph::from_transactions(&records);
        let mut ctx = RunContext::new(&graph);
        CycleDetector::new(2_000_000).detect(&mut ctx).expect("cycle detection");
        for ring in ctx.rings() {
            prop_assert!((2..=5).contains(&ring.member_accounts.len()));
        }
        for entry in ctx.ledger().iter() {
            for pattern in &entry.detected_patterns {
                prop_assert!(matches!(pattern, Pattern::CycleLength(3..=5)), "{}", pattern);
            }
        }
    }

    #[test]
    fn hub_free_cycle_rings_are_whole_and_canonical(records in arb_records()) {
        // Eight accounts can never reach the hub thresholds.
        let graph = TransactionGraph::from_transactions(&records);
        let mut ctx = RunContext::new(&graph);
        CycleDetector::new(2_000_000).detect(&mut ctx).expect("cycle detection");
        for ring in ctx.rings() {
            prop_assert!((3..=5).contains(&ring.member_accounts.len()));
            prop_assert_eq!(&ring.member_accounts, &canonicalize_cycle(&ring.member_accounts));
        }
    }

    #[test]
    fn analysis_is_deterministic(records in arb_records()) {
        prop_assert_eq!(analyze(&records), analyze(&records));
    }

    #[test]
    fn rotations_share_a_canonical_form(cycle in prop::collection::hash_set(0u32..1_000, 3..=5), shift in 0usize..5) {
        let cycle: Vec<u32> = cycle.into_iter().collect();
        let mut rotated = cycle.clone();
        rotated.rotate_left(shift % cycle.len());
        let canonical = canonicalize_cycle(&cycle);
        prop_assert_eq!(&canonical, &canonicalize_cycle(&rotated));
        prop_assert_eq!(canonical.first(), cycle.iter().min());
    }

    #[test]
    fn temporal_concentration_is_a_fraction(minutes in prop::collection::vec(0i64..200_000, 0..64)) {
        let base = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        let timestamps: Vec<_> = minutes.iter().map(|m| base + Duration::minutes(*m)).collect();
        let value = temporal_concentration(&timestamps);
        prop_assert!((0.0..=1.0).contains(&value));
        if timestamps.len() < 3 {
            prop_assert!(value == 0.0);
        }
    }
}
