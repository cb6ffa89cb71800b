use bigdecimal::BigDecimal;
use cardrank_core::{
    MemoryRankStore, PrecisionPolicy, Rank, RankSpace, RankStore, RankedCollection,
};
use proptest::prelude::*;

/// A reposition request, with keys and targets drawn from a small pool so
/// sequences hit existing items often.
#[derive(Debug, Clone)]
enum Op {
    PlaceLast(u8),
    Before(u8, u8),
    After(u8, u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_u8..24).prop_map(Op::PlaceLast),
        (0_u8..24, 0_u8..24).prop_map(|(k, t)| Op::Before(k, t)),
        (0_u8..24, 0_u8..24).prop_map(|(k, t)| Op::After(k, t)),
    ]
}

/// Precision policies the default space accepts: unlimited, or a cap at or
/// above the digits it needs.
fn arb_sig_figs() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0_u64), 28_u64..40]
}

fn arb_rank() -> impl Strategy<Value = Rank> {
    (any::<i64>(), 0_i64..30).prop_map(|(digits, scale)| Rank::new(BigDecimal::new(digits.into(), scale)))
}

/// A narrow space, so redistribution happens within a few dozen ops.
fn tight_space(sig_figs: u64) -> RankSpace {
    RankSpace::new(
        Rank::from(-1000_i64),
        Rank::from(1000_i64),
        "0.5".parse().expect("threshold"),
        PrecisionPolicy::from_sig_figs(sig_figs),
    )
    .expect("valid space")
}

/// Expected list order after applying `op`, or `None` when the engine must
/// reject it because the target is unranked.
fn apply_model(order: &[u8], op: &Op) -> Option<Vec<u8>> {
    let mut next: Vec<u8> = order.to_vec();
    match *op {
        Op::PlaceLast(key) => {
            next.retain(|k| *k != key);
            next.push(key);
        }
        Op::Before(key, target) | Op::After(key, target) => {
            if !order.contains(&target) {
                return None;
            }
            if key == target {
                return Some(next);
            }
            next.retain(|k| *k != key);
            let at = next.iter().position(|k| *k == target)?;
            let at = if matches!(op, Op::After(..)) { at + 1 } else { at };
            next.insert(at, key);
        }
    }
    Some(next)
}

fn run_ops(space: RankSpace, ops: &[Op]) -> Result<(), TestCaseError> {
    let mut coll = RankedCollection::new(space.clone(), MemoryRankStore::<u8>::new())
        .map_err(|e| TestCaseError::fail(format!("collection: {e}")))?;
    let mut model: Vec<u8> = Vec::new();

    for op in ops {
        let expected = apply_model(&model, op);
        let result = match *op {
            Op::PlaceLast(key) => coll.item(key).place_last(),
            Op::Before(key, target) => coll.item(key).insert_before(&target),
            Op::After(key, target) => coll.item(key).insert_after(&target),
        };

        match expected {
            Some(order) => {
                let change = result.map_err(|e| TestCaseError::fail(format!("{op:?}: {e}")))?;
                prop_assert!(space.contains(&change.new_rank));
                model = order;
            }
            None => prop_assert!(result.is_err(), "{:?} should fail", op),
        }

        // Engine order matches the requested order after every step.
        prop_assert_eq!(&coll.store().keys_in_rank_order()?, &model, "after {:?}", op);
    }

    // Every rank stays inside the space.
    for key in &model {
        prop_assert!(space.contains(&coll.rank_of(key)?));
    }
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn order_follows_requests_in_default_space(ops in prop::collection::vec(arb_op(), 1..80)) {
        run_ops(RankSpace::default(), &ops)?;
    }

    #[test]
    fn order_follows_requests_across_redistributions(ops in prop::collection::vec(arb_op(), 1..200)) {
        run_ops(tight_space(0), &ops)?;
    }

    #[test]
    fn order_follows_requests_with_capped_precision(ops in prop::collection::vec(arb_op(), 1..200)) {
        run_ops(tight_space(8), &ops)?;
    }

    #[test]
    fn reduce_is_idempotent(value in arb_rank(), sig_figs in arb_sig_figs()) {
        let space = RankSpace::default()
            .with_precision(PrecisionPolicy::from_sig_figs(sig_figs))
            .expect("precision accepted");
        let once = space.reduce(&value);
        prop_assert_eq!(space.reduce(&once), once.clone());
        prop_assert!(space.contains(&once));
    }

    #[test]
    fn splittable_bounds_have_a_strictly_inner_midpoint(
        min in arb_rank(),
        delta in arb_rank(),
        sig_figs in arb_sig_figs(),
    ) {
        let space = RankSpace::default()
            .with_precision(PrecisionPolicy::from_sig_figs(sig_figs))
            .expect("precision accepted");
        let max = min.plus(&delta.abs());
        prop_assume!(space.contains(&min) && space.contains(&max));
        prop_assume!(!space.collides_with_bounds(&min, &max));

        let mid = space.midpoint(&min, &max);
        prop_assert!(min < mid, "{} is not above {}", mid, min);
        prop_assert!(mid < max, "{} is not below {}", mid, max);
    }

    #[test]
    fn undersized_precision_is_rejected(sig_figs in 1_u64..28) {
        let rejected = RankSpace::default().with_precision(PrecisionPolicy::from_sig_figs(sig_figs));
        prop_assert!(rejected.is_err());
    }

    #[test]
    fn collision_straddles_threshold(base in -1_000_000_i64..1_000_000) {
        let space = RankSpace::default();
        let min = Rank::from(base);
        let double = space.threshold().plus(space.threshold());
        let tiny = Rank::new(BigDecimal::new(1.into(), 12));

        prop_assert!(!space.collides_with_bounds(&min, &min.plus(&double)));
        prop_assert!(space.collides_with_bounds(&min, &min.plus(&double.minus(&tiny))));
    }
}
