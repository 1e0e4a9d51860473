#![no_main]

use libfuzzer_sys::fuzz_target;
use mulenet_core::ingest::read_transactions;

fuzz_target!(|data: &[u8]| {
    if let Ok(outcome) = read_transactions(data) {
        for tx in &outcome.transactions {
            assert!(tx.amount.is_finite() && tx.amount >= 0.0);
        }
    }
});
