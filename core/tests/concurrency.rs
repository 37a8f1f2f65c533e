//! Plan cache behavior under concurrent first use.

use std::sync::{Arc, Barrier};
use std::thread;

use tabmap_core::{Mapped, MapperConfig, ModelMap, PlanCache, ShardKey, WireKind, WireValue};

#[derive(Debug, Default, PartialEq)]
struct Shipment {
    key: Option<ShardKey<i64>>,
    carrier: Option<String>,
    weight: f64,
    pieces: i16,
}

impl Mapped for Shipment {
    fn describe(map: &mut ModelMap<Self>) {
        map.composite("key", 's', |m| &m.key, |m| &mut m.key)
            .member("ShardId", WireKind::SmallInt)
            .member("ShipmentId", WireKind::BigInt);
        map.scalar("carrier", "Carrier", WireKind::VarChar, |m| &m.carrier, |m| &mut m.carrier)
            .length(32);
        map.scalar("weight", "Weight", WireKind::Float, |m| &m.weight, |m| &mut m.weight);
        map.scalar("pieces", "Pieces", WireKind::SmallInt, |m| &m.pieces, |m| &mut m.pieces);
    }
}

const THREADS: usize = 8;

#[test]
fn test_racing_first_use_publishes_one_plan() {
    let cache = Arc::new(PlanCache::new(MapperConfig::default()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.plan::<Shipment>().unwrap()
            })
        })
        .collect();
    let plans: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let published = cache.plan::<Shipment>().unwrap();
    for plan in &plans {
        assert_eq!(plan.schema(), published.schema());
        let ordinals: Vec<_> = plan.operations().iter().map(|op| op.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }

    let stats = cache.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits + stats.misses, THREADS + 1);
    assert_eq!(stats.misses, stats.redundant + 1);
}

#[test]
fn test_shared_plan_executes_on_many_threads() {
    let cache = Arc::new(PlanCache::default());
    let plan = cache.plan::<Shipment>().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let plan = Arc::clone(&plan);
            thread::spawn(move || {
                let shipment = Shipment {
                    key: Some(ShardKey::new('s', i as i16, i as i64 * 10)),
                    carrier: (i % 2 == 0).then(|| format!("carrier-{i}")),
                    weight: if i % 3 == 0 { f64::NAN } else { i as f64 / 4.0 },
                    pieces: i as i16,
                };
                let params = plan.to_parameters(&shipment).unwrap();
                let back = plan.from_parameters(&params).unwrap();
                (shipment, params.get("Weight").unwrap().value.clone(), back)
            })
        })
        .collect();

    for handle in handles {
        let (sent, weight, back) = handle.join().unwrap();
        assert_eq!(sent.key, back.key);
        assert_eq!(sent.carrier, back.carrier);
        assert_eq!(sent.pieces, back.pieces);
        if sent.weight.is_nan() {
            assert_eq!(weight, WireValue::Null);
            assert!(back.weight.is_nan());
        } else {
            assert_eq!(sent.weight, back.weight);
        }
    }
}
