//! End-to-end scenarios through the pool's notification entry points.

use ash_core::constants::{BATCH_ACCEPTED, SINGLE_ACCEPTED};
use ash_core::error::{PoolError, ProofError, ReplayError, ValidationError};
use ash_core::events::PoolEvent;
use ash_node::RocksStore;
use ash_pool::CombinedUnlockPolicy;
use ash_tests::helpers::*;

fn alice() -> ash_core::types::Address {
    addr(0xA1)
}

fn bob() -> ash_core::types::Address {
    addr(0xB0)
}

fn allowlist() -> Vec<(ash_core::types::Address, u128)> {
    vec![(alice(), 20_000), (bob(), 15_000), (addr(0xC0), 10_000)]
}

const WORKED_VALUES: [u64; 7] = [1, 2, 3, 4, 3, 2, 1];

// ---------------------------------------------------------------------------
// Worked example
// ---------------------------------------------------------------------------

#[test]
fn worked_example_progression() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);

    assert_eq!(
        h.pool.on_batch_received(&h.batch(alice(), &ITEM_IDS, &WORKED_VALUES)).unwrap(),
        BATCH_ACCEPTED
    );
    assert_eq!(h.pool.user_ash_per_cycle(0, &alice()).unwrap(), 129);

    assert_eq!(h.pool.on_item_received(&h.unlock_item(alice(), None)).unwrap(), SINGLE_ACCEPTED);
    h.pool.on_batch_received(&h.batch(alice(), &ITEM_IDS, &WORKED_VALUES)).unwrap();
    assert_eq!(h.pool.user_ash_per_cycle(0, &alice()).unwrap(), 129 + 258);

    h.unlock(&alice(), 20_000).unwrap();
    h.pool.on_batch_received(&h.batch(alice(), &ITEM_IDS, &WORKED_VALUES)).unwrap();
    assert_eq!(h.pool.user_ash_per_cycle(0, &alice()).unwrap(), 129 + 258 + 516);
    assert_eq!(h.pool.total_ash_per_cycle(0).unwrap(), 903);

    assert_eq!(h.ledger.burns().len(), 3);
}

#[test]
fn burns_are_forwarded_to_the_ledger_verbatim() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.pool.on_batch_received(&h.batch(bob(), &[6, 6, 1], &[1, 4, 9])).unwrap();
    assert_eq!(h.ledger.burns(), vec![(bob(), vec![6, 6, 1], vec![1, 4, 9])]);
    assert_eq!(h.pool.user_ash_per_cycle(0, &bob()).unwrap(), 25 * 5 + 9);
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[test]
fn cycles_partition_totals() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    for cycle in 0..=MAX_CYCLE {
        h.enter_cycle(cycle, CYCLE - 1);
        h.pool.on_batch_received(&h.batch(alice(), &[1], &[cycle + 1])).unwrap();
    }
    for cycle in 0..=MAX_CYCLE {
        assert_eq!(h.pool.total_ash_per_cycle(cycle).unwrap(), (cycle + 1) as u128);
    }
    assert_eq!(h.pool.total_ash_per_cycle(MAX_CYCLE + 1).unwrap(), 0);
}

#[test]
fn last_cycle_open_until_its_end() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.enter_cycle(MAX_CYCLE + 1, 0);
    let err = h.pool.on_batch_received(&h.batch(alice(), &[1], &[1])).unwrap_err();
    assert_eq!(
        err,
        PoolError::Validation(ValidationError::InvalidCycle { cycle: MAX_CYCLE + 1, max_cycle: MAX_CYCLE })
    );
    assert!(h.ledger.burns().is_empty());

    // Reads still work past the horizon.
    assert_eq!(h.pool.current_cycle().unwrap(), MAX_CYCLE + 1);
    assert_eq!(h.pool.weight_of(6), 25);
}

#[test]
fn unlocks_close_with_the_pool() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.enter_cycle(MAX_CYCLE + 3, 0);
    assert!(matches!(
        h.pool.on_item_received(&h.unlock_item(alice(), None)),
        Err(PoolError::Validation(ValidationError::InvalidCycle { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Unlocks
// ---------------------------------------------------------------------------

#[test]
fn combined_unlock_in_one_receipt() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    let payload = h.payload(&bob(), 15_000);
    h.pool.on_item_received(&h.unlock_item(bob(), Some(&payload))).unwrap();

    let info = h.pool.multiplier_info(&bob()).unwrap();
    assert_eq!((info.numerator, info.scalar), (15_000, SCALAR as u128));
    assert_eq!(info.word.numerator(), 15_000);
    assert_eq!(info.word.scalar(), 2);

    // 129 * 2 * 15000 / 10000 = 387
    h.pool.on_batch_received(&h.batch(bob(), &ITEM_IDS, &WORKED_VALUES)).unwrap();
    assert_eq!(h.pool.user_ash_per_cycle(0, &bob()).unwrap(), 387);

    let kinds: Vec<&str> = h
        .events
        .events()
        .iter()
        .map(|e| match e {
            PoolEvent::LeafConsumed { .. } => "leaf",
            PoolEvent::MultiplierUpdated { .. } => "multiplier",
            PoolEvent::AshRecorded { .. } => "ash",
        })
        .collect();
    assert_eq!(kinds, vec!["leaf", "multiplier", "multiplier", "ash"]);
}

#[test]
fn combined_unlock_failure_is_all_or_nothing() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    let mut payload = h.payload(&bob(), 15_000);
    payload.numerator = 99_999;
    assert!(matches!(
        h.pool.on_item_received(&h.unlock_item(bob(), Some(&payload))),
        Err(PoolError::Proof(ProofError::InvalidProof { .. }))
    ));
    let info = h.pool.multiplier_info(&bob()).unwrap();
    assert_eq!((info.numerator, info.scalar), (0, 0));
    assert!(h.events.is_empty());

    // The scalar can still be unlocked afterwards.
    h.pool.on_item_received(&h.unlock_item(bob(), None)).unwrap();
    assert_eq!(h.pool.multiplier_info(&bob()).unwrap().scalar, 2);
}

#[test]
fn strict_vs_skip_after_merkle_unlock() {
    for policy in [CombinedUnlockPolicy::Strict, CombinedUnlockPolicy::SkipIfSet] {
        let h = Harness::new(&allowlist(), policy);
        h.unlock(&alice(), 20_000).unwrap();
        let payload = h.payload(&alice(), 20_000);
        let result = h.pool.on_item_received(&h.unlock_item(alice(), Some(&payload)));
        let scalar = h.pool.multiplier_info(&alice()).unwrap().scalar;
        match policy {
            CombinedUnlockPolicy::Strict => {
                assert!(matches!(result, Err(PoolError::Replay(_))));
                assert_eq!(scalar, 0);
            }
            CombinedUnlockPolicy::SkipIfSet => {
                assert_eq!(result, Ok(SINGLE_ACCEPTED));
                assert_eq!(scalar, 2);
            }
        }
        assert_eq!(h.pool.multiplier_info(&alice()).unwrap().numerator, 20_000);
    }
}

#[test]
fn merkle_unlock_is_permanent() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.unlock(&addr(0xC0), 10_000).unwrap();
    let leaf = h.pool.unlock_leaf(&addr(0xC0), 10_000);
    assert_eq!(h.unlock(&addr(0xC0), 10_000), Err(PoolError::Replay(ReplayError::LeafConsumed(leaf))));

    // A proof for a different numerator would be a different leaf, but none exists.
    assert!(matches!(h.unlock(&addr(0xC0), 30_000), Err(PoolError::Proof(_))));
    assert_eq!(h.pool.multiplier_info(&addr(0xC0)).unwrap().numerator, 10_000);
}

#[test]
fn unit_numerator_leaves_ash_unchanged() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.unlock(&addr(0xC0), 10_000).unwrap();
    h.pool.on_batch_received(&h.batch(addr(0xC0), &ITEM_IDS, &WORKED_VALUES)).unwrap();
    assert_eq!(h.pool.user_ash_per_cycle(0, &addr(0xC0)).unwrap(), 129);
}

// ---------------------------------------------------------------------------
// Failure atomicity
// ---------------------------------------------------------------------------

#[test]
fn ledger_refusal_changes_nothing() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.pool.on_batch_received(&h.batch(alice(), &[1], &[3])).unwrap();

    h.ledger.set_refuse(true);
    let err = h.pool.on_batch_received(&h.batch(alice(), &ITEM_IDS, &WORKED_VALUES)).unwrap_err();
    assert!(matches!(err, PoolError::Ledger(_)));
    assert_eq!(h.pool.user_ash_per_cycle(0, &alice()).unwrap(), 3);
    assert_eq!(h.pool.total_ash_per_cycle(0).unwrap(), 3);
    assert_eq!(h.events.len(), 1);

    h.ledger.set_refuse(false);
    h.pool.on_batch_received(&h.batch(alice(), &ITEM_IDS, &WORKED_VALUES)).unwrap();
    assert_eq!(h.pool.user_ash_per_cycle(0, &alice()).unwrap(), 132);
}

#[test]
fn invalid_entry_rejects_whole_batch() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    for (ids, values) in [
        (vec![1, 2, 99], vec![1, 1, 1]),
        (vec![1, 2, 3], vec![1, 0, 1]),
        (vec![1, 2], vec![1]),
    ] {
        assert!(matches!(
            h.pool.on_batch_received(&h.batch(alice(), &ids, &values)),
            Err(PoolError::Validation(_))
        ));
    }
    assert_eq!(h.pool.total_ash_per_cycle(0).unwrap(), 0);
    assert!(h.ledger.burns().is_empty());
}

#[test]
fn notifications_from_strangers_rejected() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    let mut batch = h.batch(alice(), &[1], &[1]);
    batch.source = unlock_contract();
    assert!(matches!(
        h.pool.on_batch_received(&batch),
        Err(PoolError::Validation(ValidationError::InvalidToken(_)))
    ));

    let mut item = h.unlock_item(alice(), None);
    item.source = source_ledger();
    assert!(matches!(
        h.pool.on_item_received(&item),
        Err(PoolError::Validation(ValidationError::InvalidToken(_)))
    ));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn rocks_backed_pool_matches_memory_pool() {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksStore::open(dir.path().join("pooldata")).unwrap();
    let rocks = Harness::with_store(&allowlist(), CombinedUnlockPolicy::Strict, Box::new(store));
    let memory = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);

    for h in [&rocks, &memory] {
        h.pool.on_item_received(&h.unlock_item(bob(), Some(&h.payload(&bob(), 15_000)))).unwrap();
        h.pool.on_batch_received(&h.batch(bob(), &ITEM_IDS, &WORKED_VALUES)).unwrap();
        h.enter_cycle(2, 17);
        h.pool.on_batch_received(&h.batch(alice(), &[7], &[3])).unwrap();
    }

    for cycle in 0..4 {
        assert_eq!(
            rocks.pool.total_ash_per_cycle(cycle).unwrap(),
            memory.pool.total_ash_per_cycle(cycle).unwrap()
        );
    }
    assert_eq!(
        rocks.pool.multiplier_info(&bob()).unwrap(),
        memory.pool.multiplier_info(&bob()).unwrap()
    );
    assert_eq!(rocks.events.events(), memory.events.events());
}

#[test]
fn events_serialize_with_kind_tag() {
    let h = Harness::new(&allowlist(), CombinedUnlockPolicy::Strict);
    h.pool.on_batch_received(&h.batch(alice(), &[2], &[1])).unwrap();
    let json = serde_json::to_value(h.events.events()).unwrap();
    assert_eq!(json[0]["kind"], "ash_recorded");
    assert_eq!(json[0]["cycle"], 0);
}
