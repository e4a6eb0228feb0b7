use std::sync::{Arc, Mutex};

use supplychain_core::{AccountId, DomainError, ItemId};
use supplychain_escrow::{
    InMemoryAccounts, ItemEnvelope, ItemLedger, ItemState, LedgerConfig,
};
use supplychain_events::EventSink;

const FINNEY: u64 = 1_000_000_000_000_000;
const FUNDS: u64 = 100 * FINNEY;

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<(&'static str, ItemId)>>,
}

impl RecordingSink {
    fn names(&self) -> Vec<&'static str> {
        self.seen.lock().unwrap().iter().map(|(name, _)| *name).collect()
    }
}

impl EventSink<ItemEnvelope> for RecordingSink {
    fn emit(&self, message: ItemEnvelope) {
        self.seen
            .lock()
            .unwrap()
            .push((message.event_type(), message.aggregate_id()));
    }
}

struct World {
    ledger: ItemLedger<Arc<InMemoryAccounts>, Arc<RecordingSink>>,
    accounts: Arc<InMemoryAccounts>,
    sink: Arc<RecordingSink>,
    owner: AccountId,
    alice: AccountId,
    bob: AccountId,
    carol: AccountId,
}

impl World {
    fn new() -> Self {
        let accounts = Arc::new(InMemoryAccounts::new());
        let sink = Arc::new(RecordingSink::default());
        let owner = AccountId::new();
        let (alice, bob, carol) = (AccountId::new(), AccountId::new(), AccountId::new());
        for account in [alice, bob, carol] {
            accounts.deposit(account, FUNDS).unwrap();
        }

        let config = LedgerConfig::default()
            .with_listing_fee(FINNEY)
            .with_operating_account(owner);
        let ledger = ItemLedger::new(config, Arc::clone(&accounts), Arc::clone(&sink));

        Self {
            ledger,
            accounts,
            sink,
            owner,
            alice,
            bob,
            carol,
        }
    }

    fn list_book(&self) -> ItemId {
        self.ledger.list_item(self.alice, "book", 1000, FINNEY).unwrap()
    }
}

#[test]
fn scenario_a_listing_creates_for_sale_item() {
    let w = World::new();
    let owner_before = w.accounts.balance_of(w.owner).unwrap();

    let id = w.list_book();

    assert_eq!(id, ItemId::new(1));
    let item = w.ledger.get_item(id).unwrap();
    assert_eq!(item.name(), "book");
    assert_eq!(item.price(), 1000);
    assert_eq!(item.state(), ItemState::ForSale);
    assert_eq!(item.seller(), w.alice);
    assert_eq!(item.buyer(), None);
    assert_eq!(w.accounts.balance_of(w.owner).unwrap(), owner_before + FINNEY);
    assert_eq!(w.sink.names(), vec!["supply.item.for_sale"]);
}

#[test]
fn scenario_b_purchase_pays_seller_the_price() {
    let w = World::new();
    let id = w.list_book();
    let alice_before = w.accounts.balance_of(w.alice).unwrap();
    let bob_before = w.accounts.balance_of(w.bob).unwrap();

    w.ledger.purchase(w.bob, id, 2000).unwrap();

    let item = w.ledger.get_item(id).unwrap();
    assert_eq!(item.state(), ItemState::Sold);
    assert_eq!(item.buyer(), Some(w.bob));
    assert_eq!(w.accounts.balance_of(w.alice).unwrap(), alice_before + 1000);
    assert_eq!(w.accounts.balance_of(w.bob).unwrap(), bob_before - 1000);
}

#[test]
fn scenario_c_only_seller_ships() {
    let w = World::new();
    let id = w.list_book();
    w.ledger.purchase(w.bob, id, 2000).unwrap();

    w.ledger.mark_shipped(w.alice, id).unwrap();
    assert_eq!(w.ledger.get_item(id).unwrap().state(), ItemState::Shipped);

    let fresh = w.list_book();
    w.ledger.purchase(w.bob, fresh, 1000).unwrap();
    assert_eq!(w.ledger.mark_shipped(w.bob, fresh).unwrap_err(), DomainError::Unauthorized);
    assert_eq!(w.ledger.mark_shipped(w.carol, fresh).unwrap_err(), DomainError::Unauthorized);
    assert_eq!(w.ledger.get_item(fresh).unwrap().state(), ItemState::Sold);
}

#[test]
fn scenario_d_receipt_is_terminal() {
    let w = World::new();
    let id = w.list_book();
    w.ledger.purchase(w.bob, id, 2000).unwrap();
    w.ledger.mark_shipped(w.alice, id).unwrap();

    assert_eq!(w.ledger.confirm_receipt(w.alice, id).unwrap_err(), DomainError::Unauthorized);
    assert_eq!(w.ledger.confirm_receipt(w.carol, id).unwrap_err(), DomainError::Unauthorized);
    w.ledger.confirm_receipt(w.bob, id).unwrap();
    assert_eq!(w.ledger.get_item(id).unwrap().state(), ItemState::Received);

    assert!(matches!(
        w.ledger.mark_shipped(w.alice, id).unwrap_err(),
        DomainError::InvalidState { .. }
    ));
    assert!(matches!(
        w.ledger.purchase(w.carol, id, 5000).unwrap_err(),
        DomainError::InvalidState { .. }
    ));
    assert!(matches!(
        w.ledger.confirm_receipt(w.bob, id).unwrap_err(),
        DomainError::InvalidState { .. }
    ));

    assert_eq!(
        w.sink.names(),
        vec![
            "supply.item.for_sale",
            "supply.item.sold",
            "supply.item.shipped",
            "supply.item.received"
        ]
    );
}

#[test]
fn self_purchase_fails_regardless_of_payment() {
    let w = World::new();
    let id = w.list_book();

    for payment in [0, 999, 1000, 1_000_000] {
        assert_eq!(
            w.ledger.purchase(w.alice, id, payment).unwrap_err(),
            DomainError::SelfPurchase
        );
    }
    assert_eq!(w.ledger.get_item(id).unwrap().state(), ItemState::ForSale);
}

#[test]
fn underpayment_moves_no_funds() {
    let w = World::new();
    let id = w.list_book();
    let alice_before = w.accounts.balance_of(w.alice).unwrap();

    let err = w.ledger.purchase(w.bob, id, 999).unwrap_err();

    assert_eq!(
        err,
        DomainError::InsufficientPayment {
            price: 1000,
            payment: 999
        }
    );
    assert_eq!(w.accounts.balance_of(w.alice).unwrap(), alice_before);
    assert_eq!(w.accounts.balance_of(w.bob).unwrap(), FUNDS);
}

#[test]
fn second_purchase_cannot_steal_a_sold_item() {
    let w = World::new();
    let id = w.list_book();
    w.ledger.purchase(w.bob, id, 1000).unwrap();

    let err = w.ledger.purchase(w.carol, id, 1000).unwrap_err();

    assert!(matches!(err, DomainError::InvalidState { item, .. } if item == id));
    assert_eq!(w.ledger.get_item(id).unwrap().buyer(), Some(w.bob));
    assert_eq!(w.accounts.balance_of(w.carol).unwrap(), FUNDS);
}

#[test]
fn buyer_who_cannot_pay_leaves_item_for_sale() {
    let w = World::new();
    let id = w.list_book();
    let pauper = AccountId::new();
    w.accounts.deposit(pauper, 10).unwrap();

    let err = w.ledger.purchase(pauper, id, 1000).unwrap_err();

    assert!(matches!(err, DomainError::TransferFailed(_)));
    let item = w.ledger.get_item(id).unwrap();
    assert_eq!(item.state(), ItemState::ForSale);
    assert_eq!(item.buyer(), None);
    assert_eq!(w.accounts.balance_of(pauper).unwrap(), 10);
    assert_eq!(w.sink.names(), vec!["supply.item.for_sale"]);
}

#[test]
fn snapshot_round_trips_through_json() {
    let w = World::new();
    let id = w.list_book();
    w.ledger.purchase(w.bob, id, 1000).unwrap();

    let item = w.ledger.get_item(id).unwrap();
    let value = serde_json::to_value(&item).unwrap();

    assert_eq!(value["id"], 1);
    assert_eq!(value["state"], "sold");
    assert_eq!(value["buyer"], w.bob.to_string());
}
