//! Runs one item through its whole lifecycle against in-memory collaborators.
//!
//! alice lists a book for 1000 paying the listing fee, bob buys it offering
//! 2000, alice ships it and bob confirms receipt. Every emitted event is logged
//! and the final snapshot, event history and balances are printed as JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::json;

use supplychain_core::AccountId;
use supplychain_escrow::{InMemoryAccounts, ItemEnvelope, ItemLedger, LedgerConfig};
use supplychain_events::{BusSink, EventBus, InMemoryEventBus};

const STARTING_BALANCE: u64 = 10_000_000_000_000_000;

fn main() -> anyhow::Result<()> {
    supplychain_observability::init();

    let config = LedgerConfig::from_env().context("loading ledger config")?;
    let fee = config.listing_fee();
    let operator = config.operating_account();

    let accounts = Arc::new(InMemoryAccounts::new());
    let bus: Arc<InMemoryEventBus<ItemEnvelope>> = Arc::new(InMemoryEventBus::new());
    let events = bus.subscribe();
    let ledger = ItemLedger::new(config, Arc::clone(&accounts), BusSink::new(Arc::clone(&bus)));

    let alice = AccountId::new();
    let bob = AccountId::new();
    accounts.deposit(alice, STARTING_BALANCE)?;
    accounts.deposit(bob, STARTING_BALANCE)?;

    let item_id = ledger.list_item(alice, "book", 1000, fee)?;
    ledger.purchase(bob, item_id, 2000)?;
    ledger.mark_shipped(alice, item_id)?;
    ledger.confirm_receipt(bob, item_id)?;

    let mut history = Vec::new();
    while let Ok(envelope) = events.recv_timeout(Duration::from_millis(10)) {
        tracing::info!(
            event_id = %envelope.event_id(),
            item_id = %envelope.aggregate_id(),
            event_type = envelope.event_type(),
            sequence = envelope.sequence_number(),
            "observed event"
        );
        history.push(envelope.into_payload());
    }

    let item = ledger.get_item(item_id)?;
    let report = json!({
        "item": item,
        "events": history,
        "balances": {
            "alice": accounts.balance_of(alice)?,
            "bob": accounts.balance_of(bob)?,
            "operator": accounts.balance_of(operator)?,
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
