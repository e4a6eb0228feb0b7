use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use supplychain_core::AccountId;
use supplychain_escrow::{InMemoryAccounts, ItemEnvelope, ItemLedger, LedgerConfig};
use supplychain_events::{BusSink, EventBus, InMemoryEventBus, NullSink};

const FEE: u64 = 1;

fn setup() -> (ItemLedger<Arc<InMemoryAccounts>, NullSink>, AccountId, AccountId) {
    let accounts = Arc::new(InMemoryAccounts::new());
    let seller = AccountId::new();
    let buyer = AccountId::new();
    accounts.deposit(seller, u64::MAX / 2).unwrap();
    accounts.deposit(buyer, u64::MAX / 2).unwrap();
    let config = LedgerConfig::default().with_listing_fee(FEE);
    (ItemLedger::new(config, accounts, NullSink), seller, buyer)
}

fn bench_operation_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("operation_latency");
    group.sample_size(1000);

    group.bench_function("list_item", |b| {
        let (ledger, seller, _) = setup();
        b.iter(|| {
            black_box(ledger.list_item(seller, "book", 1000, FEE).unwrap());
        });
    });

    group.bench_function("full_lifecycle", |b| {
        let (ledger, seller, buyer) = setup();
        b.iter(|| {
            let id = ledger.list_item(seller, "book", 1000, FEE).unwrap();
            ledger.purchase(buyer, id, 1000).unwrap();
            ledger.mark_shipped(seller, id).unwrap();
            ledger.confirm_receipt(buyer, id).unwrap();
            black_box(id);
        });
    });

    group.bench_function("get_item", |b| {
        let (ledger, seller, _) = setup();
        let id = ledger.list_item(seller, "book", 1000, FEE).unwrap();
        b.iter(|| {
            black_box(ledger.get_item(id).unwrap());
        });
    });

    group.finish();
}

fn bench_emission_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("emission_overhead");

    for subscribers in [0usize, 1, 8].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            subscribers,
            |b, &subscribers| {
                let accounts = Arc::new(InMemoryAccounts::new());
                let seller = AccountId::new();
                accounts.deposit(seller, u64::MAX / 2).unwrap();
                let bus: Arc<InMemoryEventBus<ItemEnvelope>> = Arc::new(InMemoryEventBus::new());
                let _subs: Vec<_> = (0..subscribers).map(|_| bus.subscribe()).collect();
                let config = LedgerConfig::default().with_listing_fee(FEE);
                let ledger = ItemLedger::new(config, accounts, BusSink::new(Arc::clone(&bus)));

                b.iter(|| {
                    black_box(ledger.list_item(seller, "book", 1000, FEE).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_operation_latency, bench_emission_overhead);
criterion_main!(benches);
