use std::ptr::NonNull;

use clap::Parser;
use lin_hash::{ChainNode, ChronId, ChronResTable, ChronResource, Linked, Resource};

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "records", default_value_t = 100_000)]
    records: usize,

    #[arg(short = 'l', long = "level", default_value_t = 1)]
    level: u32,
}

struct Sample {
    id: ChronId,
    payload: u64,
    node: ChainNode<Self>,
}

impl Sample {
    fn new(payload: u64) -> Self {
        Sample {
            id: ChronId::new(u32::MAX),
            payload,
            node: ChainNode::new(),
        }
    }
}

impl Linked for Sample {
    fn link(&self) -> &ChainNode<Self> {
        &self.node
    }
}

impl Resource for Sample {
    type Id = ChronId;
    fn id(&self) -> &ChronId {
        &self.id
    }

    fn show(&self, level: u32) {
        if level > 2 {
            println!(
                "resource id = {} payload = {}",
                self.id.value(),
                self.payload
            );
        }
    }
}

impl ChronResource for Sample {
    fn set_id(&mut self, id: ChronId) {
        self.id = id;
    }
}

fn main() {
    let args = Args::parse();

    println!("installing {} records", args.records);

    let mut records: Vec<Box<Sample>> = (0..args.records)
        .map(|i| Box::new(Sample::new(i as u64 * 3)))
        .collect();
    let mut table: ChronResTable<Sample> = ChronResTable::new().expect("bucket allocation");

    let mut first = 0;
    let mut last = 0;
    for rec in &mut records {
        // SAFETY: the boxed records outlive the table and are not touched
        // again until after the table is dropped.
        let id = unsafe { table.add(NonNull::from(&mut **rec)) };
        if first == 0 {
            first = id;
        }
        last = id;
    }

    println!("assigned ids {}..={}", first, last);
    table.verify();
    table.show(args.level);

    let stats = table.stats();
    println!(
        "load factor: {:.2} entries per bucket",
        stats.entries as f64 / stats.buckets as f64
    );
}
