#![no_main]

use libfuzzer_sys::fuzz_target;
use mulenet_core::ingest::read_transactions;

fuzz_target!(|data: &[u8]| {
    let Ok(outcome) = read_transactions(data) else {
        return;
    };

    let report = mulenet_detect::analyze(&outcome.transactions);
    for account in &report.suspicious_accounts {
        assert!((0.0..=100.0).contains(&account.suspicion_score));
    }
    for ring in &report.fraud_rings {
        assert!(ring.member_accounts.len() >= 2);
    }

    let json = serde_json::to_string(&report).expect("report serializes");
    assert!(json.starts_with("{\"suspicious_accounts\":"));
});
