// ResTable property tests (consolidated).
//
// Property 1: the table matches a presence model under arbitrary
// add/remove/lookup interleavings.
//  - Model: per-key presence flag; one long-lived record per key plus a
//    shadow record for duplicate-insert attempts.
//  - Invariants after each step: len() matches the model count, every
//    chain passes verify(), lookups agree with the model.
//
// Property 2: the integer mixer keeps one-bit input differences visible
// under every mask width it claims to cover.
//
// Property 3: chronological tables assign strictly increasing ids no
// matter how inserts and removes interleave, and never recycle freed ids
// before the counter wraps.
//
// Property 4: string-keyed round trip with owned keys and borrowed probes.

use std::ffi::CString;
use std::ptr::NonNull;

use lin_hash::{
    integer_hash, ChainNode, ChronId, ChronResTable, ChronResource, InsertError, Linked, ResTable,
    Resource, StringId, U32Id,
};
use proptest::prelude::*;

struct Rec {
    id: U32Id,
    node: ChainNode<Self>,
}

impl Rec {
    fn new(id: u32) -> Self {
        Rec {
            id: U32Id::new(id),
            node: ChainNode::new(),
        }
    }
}

impl Linked for Rec {
    fn link(&self) -> &ChainNode<Self> {
        &self.node
    }
}

impl Resource for Rec {
    type Id = U32Id;
    fn id(&self) -> &U32Id {
        &self.id
    }
}

// Spread key indices over the id space; the odd multiplier keeps the
// mapping injective.
fn key_id(k: usize) -> u32 {
    (k as u32).wrapping_mul(0x9E37_79B9)
}

proptest! {
    #[test]
    fn prop_table_matches_model(
        keys in 2usize..=48,
        ops in proptest::collection::vec((0u8..=2u8, 0usize..256usize), 1..256),
    ) {
        let records: Vec<Box<Rec>> =
            (0..keys).map(|k| Box::new(Rec::new(key_id(k)))).collect();
        let shadows: Vec<Box<Rec>> =
            (0..keys).map(|k| Box::new(Rec::new(key_id(k)))).collect();
        let mut present = vec![false; keys];
        let mut table: ResTable<Rec> = ResTable::new().unwrap();

        for (op, raw) in ops {
            let k = raw % keys;
            let id = U32Id::new(key_id(k));
            match op {
                // Insert; a key already present is attempted through its
                // shadow record and must bounce as a duplicate.
                0 => {
                    if present[k] {
                        let res = unsafe { table.add(NonNull::from(&*shadows[k])) };
                        prop_assert_eq!(res, Err(InsertError::Duplicate));
                        prop_assert!(shadows[k].link().get().is_none());
                    } else {
                        let res = unsafe { table.add(NonNull::from(&*records[k])) };
                        prop_assert_eq!(res, Ok(()));
                        present[k] = true;
                    }
                }
                1 => {
                    let removed = table.remove(&id).is_some();
                    prop_assert_eq!(removed, present[k]);
                    present[k] = false;
                }
                2 => {
                    prop_assert_eq!(table.lookup(&id).is_some(), present[k]);
                }
                _ => unreachable!(),
            }

            let expected = present.iter().filter(|&&p| p).count();
            prop_assert_eq!(table.len(), expected);
            table.verify();
        }

        // Every installed record is visited exactly once.
        prop_assert_eq!(table.iter().count(), table.len());
        let expected = present.iter().filter(|&&p| p).count();
        prop_assert_eq!(table.iter().count(), expected);

        // Drain so no record outlives its membership by accident.
        for (k, rec) in records.iter().enumerate() {
            if present[k] {
                prop_assert!(table.remove(rec.id()).is_some());
            }
        }
        prop_assert!(table.is_empty());
    }

    #[test]
    fn prop_one_bit_flips_survive_masking(v in any::<u32>(), bit in 0u32..32) {
        let base = integer_hash(4, 32, u64::from(v));
        let flipped = integer_hash(4, 32, u64::from(v ^ (1 << bit)));
        for width in 4..=32u32 {
            let mask = ((1u64 << width) - 1) as usize;
            prop_assert_ne!(base & mask, flipped & mask, "width {}", width);
        }
    }
}

struct Item {
    id: ChronId,
    node: ChainNode<Self>,
}

impl Item {
    fn new() -> Self {
        Item {
            id: ChronId::new(u32::MAX),
            node: ChainNode::new(),
        }
    }
}

impl Linked for Item {
    fn link(&self) -> &ChainNode<Self> {
        &self.node
    }
}

impl Resource for Item {
    type Id = ChronId;
    fn id(&self) -> &ChronId {
        &self.id
    }
}

impl ChronResource for Item {
    fn set_id(&mut self, id: ChronId) {
        self.id = id;
    }
}

proptest! {
    #[test]
    fn prop_chron_ids_strictly_increase(
        ops in proptest::collection::vec((0u8..=3u8, 0usize..128usize), 1..128),
    ) {
        let mut arena: Vec<Box<Item>> =
            (0..ops.len()).map(|_| Box::new(Item::new())).collect();
        let mut table: ChronResTable<Item> = ChronResTable::new().unwrap();
        let mut live: Vec<u32> = Vec::new();
        let mut used = 0usize;
        let mut last = 0u32;

        for (op, pick) in ops {
            if op <= 2 {
                // Inserts outnumber removals three to one.
                let item = &mut arena[used];
                used += 1;
                let id = unsafe { table.add(NonNull::from(&mut **item)) };
                prop_assert!(id > last, "id {} after {}", id, last);
                last = id;
                live.push(id);
            } else if !live.is_empty() {
                let id = live.swap_remove(pick % live.len());
                prop_assert!(table.remove(ChronId::new(id)).is_some());
                // Freed ids stay retired until the counter wraps.
                prop_assert!(table.lookup(ChronId::new(id)).is_none());
            }
            prop_assert_eq!(table.len(), live.len());
            table.verify();
        }
    }
}

struct Named {
    name: StringId<'static>,
    node: ChainNode<Self>,
}

impl Linked for Named {
    fn link(&self) -> &ChainNode<Self> {
        &self.node
    }
}

impl Resource for Named {
    type Id = StringId<'static>;
    fn id(&self) -> &StringId<'static> {
        &self.name
    }
}

proptest! {
    #[test]
    fn prop_string_keys_round_trip(
        names in proptest::collection::hash_set("[a-z0-9:.]{1,16}", 1..48),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let records: Vec<Box<Named>> = names
            .iter()
            .map(|name| {
                let backing = CString::new(name.as_str()).unwrap();
                Box::new(Named {
                    name: StringId::copied(&backing).unwrap(),
                    node: ChainNode::new(),
                })
            })
            .collect();

        let mut table: ResTable<Named> = ResTable::new().unwrap();
        for rec in &records {
            let res = unsafe { table.add(NonNull::from(&**rec)) };
            prop_assert_eq!(res, Ok(()));
        }
        prop_assert_eq!(table.len(), names.len());
        table.verify();

        // Probe with borrowed ids against owned keys.
        for name in &names {
            let backing = CString::new(name.as_str()).unwrap();
            let probe = StringId::borrowed(&backing);
            prop_assert!(table.lookup(&probe).is_some());
        }

        // Remove every other record, then re-check both halves.
        for rec in records.iter().step_by(2) {
            prop_assert!(table.remove(rec.id()).is_some());
        }
        for (i, name) in names.iter().enumerate() {
            let backing = CString::new(name.as_str()).unwrap();
            let probe = StringId::borrowed(&backing);
            prop_assert_eq!(table.lookup(&probe).is_some(), i % 2 == 1);
        }
        table.verify();
    }
}
