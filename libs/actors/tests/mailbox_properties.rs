//! Mailbox Property Tests
//!
//! Ordering and conservation laws that must hold for any interleaving of
//! producers and any payload sequence.

use actors::{Mailbox, Message};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_single_producer_fifo(payloads in prop::collection::vec(any::<u64>(), 0..200)) {
        let mut mailbox = Mailbox::new("inbox");
        let sender = Mailbox::new("sender");

        for value in &payloads {
            mailbox.put(sender.address(), Message::new(*value)).unwrap();
        }
        prop_assert_eq!(mailbox.len(), payloads.len());

        let mut drained = Vec::with_capacity(payloads.len());
        while let Ok(envelope) = mailbox.get() {
            drained.push(*envelope.message.downcast_ref::<u64>().unwrap());
        }
        prop_assert_eq!(drained, payloads);
        prop_assert!(mailbox.is_empty());
    }

    #[test]
    fn prop_interleaved_producers_keep_their_order(
        schedule in prop::collection::vec(0usize..4, 1..300)
    ) {
        let mut mailbox = Mailbox::new("inbox");
        let producers: Vec<Mailbox> = (0..4).map(|i| Mailbox::new(format!("p{i}"))).collect();
        let mut sent = [0u32; 4];

        for &p in &schedule {
            mailbox.put(producers[p].address(), Message::new((p, sent[p]))).unwrap();
            sent[p] += 1;
        }

        let mut received = [0u32; 4];
        let mut total = 0;
        while let Ok(envelope) = mailbox.get() {
            let &(p, seq) = envelope.message.downcast_ref::<(usize, u32)>().unwrap();
            prop_assert_eq!(envelope.sender.name(), format!("p{p}"));
            prop_assert_eq!(seq, received[p]);
            received[p] += 1;
            total += 1;
        }

        // Nothing lost, nothing duplicated
        prop_assert_eq!(total, schedule.len());
        prop_assert_eq!(received, sent);
    }

    #[test]
    fn prop_len_tracks_puts_minus_gets(puts in 0usize..64, gets in 0usize..64) {
        let mut mailbox = Mailbox::new("inbox");
        let sender = Mailbox::new("sender");
        for i in 0..puts {
            mailbox.put(sender.address(), Message::new(i)).unwrap();
        }

        let mut taken = 0;
        for _ in 0..gets {
            if mailbox.get().is_ok() {
                taken += 1;
            }
        }
        prop_assert_eq!(taken, puts.min(gets));
        prop_assert_eq!(mailbox.len(), puts - taken);
    }
}
