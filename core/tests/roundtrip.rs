//! Property tests: every mapped value survives parameters and rows.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tabmap_core::{Mapped, ModelMap, PlanCache, WireKind};
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq)]
struct Everything {
    code: Option<String>,
    title: String,
    blob: Option<Vec<u8>>,
    tiny: u8,
    small: Option<i16>,
    int: i32,
    big: i64,
    flag: bool,
    amount: Decimal,
    price: Option<Decimal>,
    ratio: f64,
    real: Option<f32>,
    day: NaiveDate,
    stamp: NaiveDateTime,
    elapsed: TimeDelta,
    id: Uuid,
}

impl Mapped for Everything {
    fn describe(map: &mut ModelMap<Self>) {
        map.scalar("code", "Code", WireKind::VarChar, |m| &m.code, |m| &mut m.code)
            .length(12);
        map.scalar("title", "Title", WireKind::NVarChar, |m| &m.title, |m| &mut m.title)
            .length(-1);
        map.scalar("blob", "Blob", WireKind::VarBinary, |m| &m.blob, |m| &mut m.blob)
            .length(64);
        map.scalar("tiny", "Tiny", WireKind::TinyInt, |m| &m.tiny, |m| &mut m.tiny);
        map.scalar("small", "Small", WireKind::SmallInt, |m| &m.small, |m| &mut m.small);
        map.scalar("int", "Int", WireKind::Int, |m| &m.int, |m| &mut m.int);
        map.scalar("big", "Big", WireKind::BigInt, |m| &m.big, |m| &mut m.big);
        map.scalar("flag", "Flag", WireKind::Bit, |m| &m.flag, |m| &mut m.flag);
        map.scalar("amount", "Amount", WireKind::Decimal, |m| &m.amount, |m| &mut m.amount)
            .precision(18, 4);
        map.scalar("price", "Price", WireKind::Money, |m| &m.price, |m| &mut m.price);
        map.scalar("ratio", "Ratio", WireKind::Float, |m| &m.ratio, |m| &mut m.ratio);
        map.scalar("real", "Real", WireKind::Real, |m| &m.real, |m| &mut m.real);
        map.scalar("day", "Day", WireKind::Date, |m| &m.day, |m| &mut m.day);
        map.scalar("stamp", "Stamp", WireKind::DateTime2, |m| &m.stamp, |m| &mut m.stamp);
        map.scalar("elapsed", "Elapsed", WireKind::Time, |m| &m.elapsed, |m| &mut m.elapsed);
        map.scalar("id", "Id", WireKind::UniqueIdentifier, |m| &m.id, |m| &mut m.id);
    }
}

fn arb_decimal(limit: i64, scale: u32) -> impl Strategy<Value = Decimal> {
    (-limit..limit).prop_map(move |n| Decimal::new(n, scale))
}

prop_compose! {
    fn arb_everything()(
        (code, title, blob, tiny) in (
            proptest::option::of("[A-Z0-9]{0,12}"),
            "\\PC{0,80}",
            proptest::option::of(prop::collection::vec(any::<u8>(), 0..64)),
            any::<u8>(),
        ),
        (small, int, big, flag) in (
            proptest::option::of(any::<i16>()),
            any::<i32>(),
            any::<i64>(),
            any::<bool>(),
        ),
        (amount, price, ratio, real) in (
            arb_decimal(100_000_000_000_000, 4),
            proptest::option::of(arb_decimal(1_000_000_000_000_000, 4)),
            -1.0e12f64..1.0e12,
            proptest::option::of(-1.0e6f32..1.0e6),
        ),
        (days, seconds, nanos, id) in (
            0i64..3_000_000,
            -30_000_000_000i64..200_000_000_000,
            0i64..86_400_000_000_000,
            any::<u128>(),
        )
    ) -> Everything {
        Everything {
            code,
            title,
            blob,
            tiny,
            small,
            int,
            big,
            flag,
            amount,
            price,
            ratio,
            real,
            day: NaiveDate::from_num_days_from_ce_opt(days as i32 + 1).unwrap_or_default(),
            stamp: DateTime::from_timestamp(seconds, 0).map(|t| t.naive_utc()).unwrap_or_default(),
            elapsed: TimeDelta::nanoseconds(nanos),
            id: Uuid::from_u128(id),
        }
    }
}

/// Every scalar wire kind behind `Option`, so each is seen present and absent.
#[derive(Debug, Default, Clone, PartialEq)]
struct EveryKind {
    fixed_text: Option<String>,
    text: Option<String>,
    fixed_wide: Option<String>,
    wide: Option<String>,
    fixed_bytes: Option<Vec<u8>>,
    bytes: Option<Vec<u8>>,
    tiny: Option<u8>,
    small: Option<i16>,
    int: Option<i32>,
    big: Option<i64>,
    flag: Option<bool>,
    exact: Option<Decimal>,
    money: Option<Decimal>,
    small_money: Option<Decimal>,
    double: Option<f64>,
    single: Option<f32>,
    day: Option<NaiveDate>,
    legacy: Option<NaiveDateTime>,
    stamp: Option<NaiveDateTime>,
    zoned: Option<DateTime<FixedOffset>>,
    time: Option<TimeDelta>,
    guid: Option<Uuid>,
    token: Uuid,
}

impl Mapped for EveryKind {
    fn describe(map: &mut ModelMap<Self>) {
        map.scalar("fixed_text", "FixedText", WireKind::Char, |m| &m.fixed_text, |m| {
            &mut m.fixed_text
        })
        .length(4);
        map.scalar("text", "Text", WireKind::VarChar, |m| &m.text, |m| &mut m.text)
            .length(12);
        map.scalar("fixed_wide", "FixedWide", WireKind::NChar, |m| &m.fixed_wide, |m| {
            &mut m.fixed_wide
        })
        .length(3);
        map.scalar("wide", "Wide", WireKind::NVarChar, |m| &m.wide, |m| &mut m.wide)
            .length(-1);
        map.scalar("fixed_bytes", "FixedBytes", WireKind::Binary, |m| &m.fixed_bytes, |m| {
            &mut m.fixed_bytes
        })
        .length(8);
        map.scalar("bytes", "Bytes", WireKind::VarBinary, |m| &m.bytes, |m| &mut m.bytes)
            .length(64);
        map.scalar("tiny", "Tiny", WireKind::TinyInt, |m| &m.tiny, |m| &mut m.tiny);
        map.scalar("small", "Small", WireKind::SmallInt, |m| &m.small, |m| &mut m.small);
        map.scalar("int", "Int", WireKind::Int, |m| &m.int, |m| &mut m.int);
        map.scalar("big", "Big", WireKind::BigInt, |m| &m.big, |m| &mut m.big);
        map.scalar("flag", "Flag", WireKind::Bit, |m| &m.flag, |m| &mut m.flag);
        map.scalar("exact", "Exact", WireKind::Decimal, |m| &m.exact, |m| &mut m.exact)
            .precision(10, 2);
        map.scalar("money", "Money", WireKind::Money, |m| &m.money, |m| &mut m.money);
        map.scalar("small_money", "SmallMoney", WireKind::SmallMoney, |m| &m.small_money, |m| {
            &mut m.small_money
        });
        map.scalar("double", "Double", WireKind::Float, |m| &m.double, |m| &mut m.double);
        map.scalar("single", "Single", WireKind::Real, |m| &m.single, |m| &mut m.single);
        map.scalar("day", "Day", WireKind::Date, |m| &m.day, |m| &mut m.day);
        map.scalar("legacy", "Legacy", WireKind::DateTime, |m| &m.legacy, |m| &mut m.legacy);
        map.scalar("stamp", "Stamp", WireKind::DateTime2, |m| &m.stamp, |m| &mut m.stamp);
        map.scalar("zoned", "Zoned", WireKind::DateTimeOffset, |m| &m.zoned, |m| &mut m.zoned);
        map.scalar("time", "Time", WireKind::Time, |m| &m.time, |m| &mut m.time);
        map.scalar("guid", "Guid", WireKind::UniqueIdentifier, |m| &m.guid, |m| &mut m.guid);
        map.scalar("token", "Token", WireKind::UniqueIdentifier, |m| &m.token, |m| &mut m.token);
    }
}

fn timestamp(seconds: i64) -> NaiveDateTime {
    DateTime::from_timestamp(seconds, 0)
        .map(|t| t.naive_utc())
        .unwrap_or_default()
}

fn zoned(seconds: i64, offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
    DateTime::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

prop_compose! {
    fn arb_every_kind()(
        (fixed_text, text, fixed_wide, wide, fixed_bytes, bytes) in (
            proptest::option::of("[a-z]{0,4}"),
            proptest::option::of("[A-Za-z0-9 ]{0,12}"),
            proptest::option::of("\\PC{0,3}"),
            proptest::option::of("\\PC{0,40}"),
            proptest::option::of(prop::collection::vec(any::<u8>(), 0..=8)),
            proptest::option::of(prop::collection::vec(any::<u8>(), 0..64)),
        ),
        (tiny, small, int, big, flag) in (
            proptest::option::of(any::<u8>()),
            proptest::option::of(any::<i16>()),
            proptest::option::of(any::<i32>()),
            proptest::option::of(any::<i64>()),
            proptest::option::of(any::<bool>()),
        ),
        (exact, money, small_money, double, single) in (
            proptest::option::of(arb_decimal(10_000_000_000, 2)),
            proptest::option::of(arb_decimal(1_000_000_000_000_000, 4)),
            proptest::option::of(arb_decimal(2_147_483_647, 4)),
            proptest::option::of(-1.0e12f64..1.0e12),
            proptest::option::of(-1.0e6f32..1.0e6),
        ),
        (days, legacy, stamp, zoned_at, time, guid, token) in (
            proptest::option::of(0i64..3_000_000),
            proptest::option::of(-6_000_000_000i64..200_000_000_000),
            proptest::option::of(-30_000_000_000i64..200_000_000_000),
            proptest::option::of((0i64..200_000_000_000, -840i32..=840)),
            proptest::option::of(0i64..86_400_000_000_000),
            proptest::option::of(any::<u128>()),
            prop_oneof![Just(0u128), any::<u128>()],
        )
    ) -> EveryKind {
        EveryKind {
            fixed_text,
            text,
            fixed_wide,
            wide,
            fixed_bytes,
            bytes,
            tiny,
            small,
            int,
            big,
            flag,
            exact,
            money,
            small_money,
            double,
            single,
            day: days.map(|d| {
                NaiveDate::from_num_days_from_ce_opt(d as i32 + 1).unwrap_or_default()
            }),
            legacy: legacy.map(timestamp),
            stamp: stamp.map(timestamp),
            zoned: zoned_at.map(|(seconds, minutes)| zoned(seconds, minutes)),
            time: time.map(TimeDelta::nanoseconds),
            guid: guid.map(Uuid::from_u128),
            token: Uuid::from_u128(token),
        }
    }
}

proptest! {
    #[test]
    fn prop_parameters_roundtrip(value in arb_everything()) {
        let plan = PlanCache::global().plan::<Everything>().unwrap();
        let params = plan.to_parameters(&value).unwrap();
        prop_assert_eq!(params.len(), plan.schema().len());
        prop_assert_eq!(plan.from_parameters(&params).unwrap(), value);
    }

    #[test]
    fn prop_rows_roundtrip(values in prop::collection::vec(arb_everything(), 0..8)) {
        let plan = PlanCache::global().plan::<Everything>().unwrap();
        let set = plan.to_rows(&values).unwrap();
        prop_assert_eq!(set.len(), values.len());
        prop_assert_eq!(plan.read(&mut set.reader()).unwrap(), values);
    }

    #[test]
    fn prop_every_kind_parameters_roundtrip(value in arb_every_kind()) {
        let plan = PlanCache::global().plan::<EveryKind>().unwrap();
        let params = plan.to_parameters(&value).unwrap();
        prop_assert_eq!(params.len(), plan.schema().len());
        prop_assert_eq!(plan.from_parameters(&params).unwrap(), value);
    }

    #[test]
    fn prop_every_kind_rows_roundtrip(values in prop::collection::vec(arb_every_kind(), 0..8)) {
        let plan = PlanCache::global().plan::<EveryKind>().unwrap();
        let set = plan.to_rows(&values).unwrap();
        prop_assert_eq!(plan.read(&mut set.reader()).unwrap(), values);
    }
}
