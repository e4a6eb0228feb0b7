//! Supply-chain escrow ledger.
//!
//! A seller lists an item, a buyer purchases it (paying the seller), the seller
//! ships it and the buyer confirms receipt. [`ItemLedger`] owns every item and
//! couples each state transition with the value transfer it implies.

pub mod config;
pub mod item;
pub mod ledger;
pub mod transfer;

pub use config::{ConfigError, LedgerConfig};
pub use item::{
    ConfirmReceipt, Item, ItemCommand, ItemEvent, ItemListed, ItemReceived, ItemShipped, ItemSold,
    ItemState, ListItem, MarkShipped, Purchase,
};
pub use ledger::{ItemEnvelope, ItemLedger};
pub use transfer::{InMemoryAccounts, TransferError, ValueTransferService};
