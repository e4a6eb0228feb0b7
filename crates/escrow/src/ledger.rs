//! The item ledger: lifecycle enforcement coupled with value movement.
//!
//! Every mutating operation follows the same pipeline:
//!
//! ```text
//! command
//!   ↓
//! 1. Decide   (Item::handle, pure; rejects with a DomainError)
//!   ↓
//! 2. Settle   (ValueTransferService::transfer, if the transition moves value)
//!   ↓
//! 3. Commit   (Item::apply, under the same item lock)
//!   ↓
//! 4. Emit     (EventSink::emit, still under the item lock)
//! ```
//!
//! A failure in steps 1 or 2 leaves the item and all balances untouched.
//! Step 4 cannot fail the operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use uuid::Uuid;

use supplychain_core::{AccountId, Aggregate, AggregateRoot, DomainError, DomainResult, ItemId};
use supplychain_events::{EventEnvelope, EventSink};

use crate::config::LedgerConfig;
use crate::item::{
    AGGREGATE_TYPE, ConfirmReceipt, Item, ItemCommand, ItemEvent, ListItem, MarkShipped, Purchase,
};
use crate::transfer::ValueTransferService;

/// Envelope type handed to the ledger's sink.
pub type ItemEnvelope = EventEnvelope<ItemEvent>;

#[derive(Debug)]
struct Items {
    by_id: HashMap<ItemId, Arc<Mutex<Item>>>,
    next_id: u64,
}

/// Owner of every item record.
///
/// The map lock is only held long enough to allocate ids and look up records;
/// each item has its own mutex, so operations on different items never contend.
/// Sinks are called with the item lock held and must not block.
#[derive(Debug)]
pub struct ItemLedger<T, S> {
    config: LedgerConfig,
    transfers: T,
    sink: S,
    items: RwLock<Items>,
}

impl<T, S> ItemLedger<T, S>
where
    T: ValueTransferService,
    S: EventSink<ItemEnvelope>,
{
    pub fn new(config: LedgerConfig, transfers: T, sink: S) -> Self {
        Self {
            config,
            transfers,
            sink,
            items: RwLock::new(Items {
                by_id: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn transfers(&self) -> &T {
        &self.transfers
    }

    /// List a new item for sale, charging the listing fee to `caller`.
    ///
    /// The fee is settled before the map lock is taken; the lock only covers id
    /// allocation and insertion, so a rejected listing never consumes an id.
    pub fn list_item(
        &self,
        caller: AccountId,
        name: impl Into<String>,
        price: u64,
        listing_fee: u64,
    ) -> DomainResult<ItemId> {
        let mut command = ListItem {
            item_id: ItemId::new(0),
            seller: caller,
            name: name.into(),
            price,
            occurred_at: Utc::now(),
        };

        command
            .validate()
            .and_then(|()| self.charge_listing_fee(caller, listing_fee))
            .inspect_err(|err| rejected("list_item", None, caller, err))?;

        self.insert_listing(&mut command).inspect_err(|err| {
            rejected("list_item", None, caller, err);
            self.refund_listing_fee(caller, listing_fee);
        })
    }

    fn charge_listing_fee(&self, caller: AccountId, listing_fee: u64) -> DomainResult<()> {
        let required = self.config.listing_fee();
        if listing_fee != required {
            return Err(DomainError::InsufficientFee {
                required,
                supplied: listing_fee,
            });
        }
        self.transfers
            .transfer(caller, self.config.operating_account(), listing_fee)?;
        Ok(())
    }

    fn refund_listing_fee(&self, caller: AccountId, listing_fee: u64) {
        if let Err(err) = self
            .transfers
            .transfer(self.config.operating_account(), caller, listing_fee)
        {
            tracing::error!(%caller, listing_fee, error = %err, "failed to refund listing fee");
        }
    }

    fn insert_listing(&self, command: &mut ListItem) -> DomainResult<ItemId> {
        let mut items = self
            .items
            .write()
            .map_err(|_| DomainError::internal("item map lock poisoned"))?;

        let item_id = ItemId::new(items.next_id);
        command.item_id = item_id;
        let mut item = Item::empty(item_id);
        let events = item.handle(&ItemCommand::ListItem(command.clone()))?;
        let envelopes = commit(&mut item, events);

        // Hold the new item's lock until its listing event is out, so no later
        // transition on it can be emitted first.
        let cell = Arc::new(Mutex::new(item));
        let _item = lock_item(&cell)?;
        items.by_id.insert(item_id, Arc::clone(&cell));
        items.next_id += 1;
        drop(items);

        tracing::info!(%item_id, seller = %command.seller, price = command.price, "item listed for sale");
        self.publish(envelopes);
        Ok(item_id)
    }

    /// Buy an item, paying its price to the seller.
    ///
    /// Only `price` is moved even when `payment` exceeds it; the excess stays
    /// with the caller.
    pub fn purchase(&self, caller: AccountId, item_id: ItemId, payment: u64) -> DomainResult<()> {
        let command = ItemCommand::Purchase(Purchase {
            item_id,
            buyer: caller,
            payment,
            occurred_at: Utc::now(),
        });

        self.execute("purchase", item_id, caller, &command, |item| {
            self.transfers.transfer(caller, item.seller(), item.price())?;
            Ok(())
        })?;

        tracing::info!(%item_id, buyer = %caller, "item sold");
        Ok(())
    }

    /// Seller marks a sold item as shipped.
    pub fn mark_shipped(&self, caller: AccountId, item_id: ItemId) -> DomainResult<()> {
        let command = ItemCommand::MarkShipped(MarkShipped {
            item_id,
            caller,
            occurred_at: Utc::now(),
        });

        self.execute("mark_shipped", item_id, caller, &command, |_| Ok(()))?;

        tracing::info!(%item_id, "item shipped");
        Ok(())
    }

    /// Buyer confirms a shipped item arrived. Terminal.
    pub fn confirm_receipt(&self, caller: AccountId, item_id: ItemId) -> DomainResult<()> {
        let command = ItemCommand::ConfirmReceipt(ConfirmReceipt {
            item_id,
            caller,
            occurred_at: Utc::now(),
        });

        self.execute("confirm_receipt", item_id, caller, &command, |_| Ok(()))?;

        tracing::info!(%item_id, "item received");
        Ok(())
    }

    /// Snapshot of an item's current record.
    pub fn get_item(&self, item_id: ItemId) -> DomainResult<Item> {
        let cell = self.cell(item_id)?;
        let item = lock_item(&cell)?;
        Ok(item.clone())
    }

    fn cell(&self, item_id: ItemId) -> DomainResult<Arc<Mutex<Item>>> {
        let items = self
            .items
            .read()
            .map_err(|_| DomainError::internal("item map lock poisoned"))?;
        items
            .by_id
            .get(&item_id)
            .cloned()
            .ok_or(DomainError::NotFound(item_id))
    }

    fn execute<F>(
        &self,
        operation: &'static str,
        item_id: ItemId,
        caller: AccountId,
        command: &ItemCommand,
        settle: F,
    ) -> DomainResult<()>
    where
        F: FnOnce(&Item) -> DomainResult<()>,
    {
        let cell = self
            .cell(item_id)
            .inspect_err(|err| rejected(operation, Some(item_id), caller, err))?;
        let mut item = lock_item(&cell)?;

        let events = item
            .handle(command)
            .and_then(|events| settle(&*item).map(|()| events))
            .inspect_err(|err| rejected(operation, Some(item_id), caller, err))?;

        let envelopes = commit(&mut *item, events);
        // Emitted under the item lock: the sink sees each item's events in
        // commit order.
        self.publish(envelopes);
        Ok(())
    }

    fn publish(&self, envelopes: Vec<ItemEnvelope>) {
        for envelope in envelopes {
            tracing::debug!(
                item_id = %envelope.aggregate_id(),
                event_type = envelope.event_type(),
                sequence = envelope.sequence_number(),
                "emitting event"
            );
            self.sink.emit(envelope);
        }
    }
}

fn lock_item(cell: &Mutex<Item>) -> DomainResult<MutexGuard<'_, Item>> {
    cell.lock()
        .map_err(|_| DomainError::internal("item lock poisoned"))
}

fn commit(item: &mut Item, events: Vec<ItemEvent>) -> Vec<ItemEnvelope> {
    events
        .into_iter()
        .map(|event| {
            item.apply(&event);
            EventEnvelope::new(
                Uuid::now_v7(),
                item.id_typed(),
                AGGREGATE_TYPE,
                item.version(),
                event,
            )
        })
        .collect()
}

fn rejected(operation: &'static str, item_id: Option<ItemId>, caller: AccountId, err: &DomainError) {
    tracing::warn!(
        operation,
        item_id = item_id.map(|id| id.get()),
        %caller,
        kind = err.kind(),
        error = %err,
        "operation rejected"
    );
}
