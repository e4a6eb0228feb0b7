use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use supplychain_core::{AccountId, Aggregate, AggregateRoot, DomainError, ItemId};
use supplychain_events::Event;

/// Aggregate type tag stamped on every item event envelope.
pub const AGGREGATE_TYPE: &str = "supply.item";

/// Item lifecycle. Transitions only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    ForSale,
    Sold,
    Shipped,
    Received,
}

impl ItemState {
    /// The state this one advances to, if any.
    pub fn next(self) -> Option<ItemState> {
        match self {
            ItemState::ForSale => Some(ItemState::Sold),
            ItemState::Sold => Some(ItemState::Shipped),
            ItemState::Shipped => Some(ItemState::Received),
            ItemState::Received => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl core::fmt::Display for ItemState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ItemState::ForSale => "for_sale",
            ItemState::Sold => "sold",
            ItemState::Shipped => "shipped",
            ItemState::Received => "received",
        };
        f.write_str(s)
    }
}

/// Aggregate root: Item.
///
/// A fresh `Item::empty(id)` is not listed yet (`version() == 0`); the
/// `ListItem` command turns it into a `ForSale` record. Callers outside the
/// ledger only ever see clones of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    /// Price in smallest currency unit.
    price: u64,
    state: ItemState,
    seller: AccountId,
    buyer: Option<AccountId>,
    version: u64,
}

impl Item {
    /// Create an empty, not-yet-listed aggregate instance.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            name: String::new(),
            price: 0,
            state: ItemState::ForSale,
            seller: AccountId::from_uuid(Uuid::nil()),
            buyer: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Seller of the item. Nil until the item is listed.
    pub fn seller(&self) -> AccountId {
        self.seller
    }

    pub fn buyer(&self) -> Option<AccountId> {
        self.buyer
    }

    pub fn is_listed(&self) -> bool {
        self.version > 0
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: ListItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub item_id: ItemId,
    pub seller: AccountId,
    pub name: String,
    pub price: u64,
    pub occurred_at: DateTime<Utc>,
}

impl ListItem {
    /// Checks that do not depend on ledger state. A blank name (empty or
    /// whitespace only) or a zero price is rejected; the name is kept verbatim.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid_input("name must not be empty"));
        }

        if self.price == 0 {
            return Err(DomainError::invalid_input("price must be positive"));
        }

        Ok(())
    }
}

/// Command: Purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub item_id: ItemId,
    pub buyer: AccountId,
    pub payment: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkShipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkShipped {
    pub item_id: ItemId,
    pub caller: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmReceipt {
    pub item_id: ItemId,
    pub caller: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCommand {
    ListItem(ListItem),
    Purchase(Purchase),
    MarkShipped(MarkShipped),
    ConfirmReceipt(ConfirmReceipt),
}

/// Event: ItemListed (the item is for sale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListed {
    pub item_id: ItemId,
    pub seller: AccountId,
    pub name: String,
    pub price: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSold {
    pub item_id: ItemId,
    pub buyer: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemShipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemShipped {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReceived {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEvent {
    ItemListed(ItemListed),
    ItemSold(ItemSold),
    ItemShipped(ItemShipped),
    ItemReceived(ItemReceived),
}

impl ItemEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            ItemEvent::ItemListed(e) => e.item_id,
            ItemEvent::ItemSold(e) => e.item_id,
            ItemEvent::ItemShipped(e) => e.item_id,
            ItemEvent::ItemReceived(e) => e.item_id,
        }
    }
}

impl Event for ItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ItemEvent::ItemListed(_) => "supply.item.for_sale",
            ItemEvent::ItemSold(_) => "supply.item.sold",
            ItemEvent::ItemShipped(_) => "supply.item.shipped",
            ItemEvent::ItemReceived(_) => "supply.item.received",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ItemEvent::ItemListed(e) => e.occurred_at,
            ItemEvent::ItemSold(e) => e.occurred_at,
            ItemEvent::ItemShipped(e) => e.occurred_at,
            ItemEvent::ItemReceived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Item {
    type Command = ItemCommand;
    type Event = ItemEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ItemEvent::ItemListed(e) => {
                self.id = e.item_id;
                self.name = e.name.clone();
                self.price = e.price;
                self.seller = e.seller;
                self.buyer = None;
                self.state = ItemState::ForSale;
            }
            ItemEvent::ItemSold(e) => {
                self.buyer = Some(e.buyer);
                self.state = ItemState::Sold;
            }
            ItemEvent::ItemShipped(_) => {
                self.state = ItemState::Shipped;
            }
            ItemEvent::ItemReceived(_) => {
                self.state = ItemState::Received;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ItemCommand::ListItem(cmd) => self.handle_list(cmd),
            ItemCommand::Purchase(cmd) => self.handle_purchase(cmd),
            ItemCommand::MarkShipped(cmd) => self.handle_mark_shipped(cmd),
            ItemCommand::ConfirmReceipt(cmd) => self.handle_confirm_receipt(cmd),
        }
    }
}

impl Item {
    fn ensure_listed(&self, item_id: ItemId) -> Result<(), DomainError> {
        if !self.is_listed() || self.id != item_id {
            return Err(DomainError::NotFound(item_id));
        }
        Ok(())
    }

    fn ensure_state(&self, expected: ItemState) -> Result<(), DomainError> {
        if self.state != expected {
            return Err(DomainError::invalid_state(self.id, self.state));
        }
        Ok(())
    }

    fn handle_list(&self, cmd: &ListItem) -> Result<Vec<ItemEvent>, DomainError> {
        if self.is_listed() {
            return Err(DomainError::invalid_state(self.id, self.state));
        }

        cmd.validate()?;

        Ok(vec![ItemEvent::ItemListed(ItemListed {
            item_id: cmd.item_id,
            seller: cmd.seller,
            name: cmd.name.clone(),
            price: cmd.price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_purchase(&self, cmd: &Purchase) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_listed(cmd.item_id)?;
        self.ensure_state(ItemState::ForSale)?;

        if self.seller == cmd.buyer {
            return Err(DomainError::SelfPurchase);
        }

        if cmd.payment < self.price {
            return Err(DomainError::InsufficientPayment {
                price: self.price,
                payment: cmd.payment,
            });
        }

        Ok(vec![ItemEvent::ItemSold(ItemSold {
            item_id: cmd.item_id,
            buyer: cmd.buyer,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_shipped(&self, cmd: &MarkShipped) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_listed(cmd.item_id)?;
        self.ensure_state(ItemState::Sold)?;

        if self.seller != cmd.caller {
            return Err(DomainError::Unauthorized);
        }

        Ok(vec![ItemEvent::ItemShipped(ItemShipped {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm_receipt(&self, cmd: &ConfirmReceipt) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_listed(cmd.item_id)?;
        self.ensure_state(ItemState::Shipped)?;

        if self.buyer != Some(cmd.caller) {
            return Err(DomainError::Unauthorized);
        }

        Ok(vec![ItemEvent::ItemReceived(ItemReceived {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
