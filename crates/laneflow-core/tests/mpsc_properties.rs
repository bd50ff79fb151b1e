//! Property tests for the unbounded MPSC mailbox.

use std::sync::Arc;
use std::thread;

use laneflow_core::Mailbox;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn single_producer_preserves_order(values in prop::collection::vec(any::<u32>(), 0..512)) {
        let mailbox = Mailbox::new();
        for &v in &values {
            mailbox.enqueue(v);
        }
        let mut drained = Vec::with_capacity(values.len());
        while let Some(v) = mailbox.poll() {
            drained.push(v);
        }
        prop_assert_eq!(drained, values);
    }

    #[test]
    fn every_sent_value_is_eventually_delivered(
        producer_batches in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..6)
    ) {
        let mailbox = Arc::new(Mailbox::new());
        let total_sent: usize = producer_batches.iter().map(|b| b.len()).sum();

        let handles: Vec<_> = producer_batches
            .into_iter()
            .map(|batch| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    for v in batch {
                        mailbox.enqueue(v);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut received = 0;
        while mailbox.poll().is_some() {
            received += 1;
        }
        prop_assert_eq!(received, total_sent);
    }
}
