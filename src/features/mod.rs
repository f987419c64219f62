mod account;
mod ledger;
mod persist;
mod store;
mod transaction;

pub use self::{
    account::{Account, AccountError, AccountRecord, AccountResult, AccountType, Amounts},
    ledger::LedgerStore,
    store::AccountStore,
    transaction::{
        Posting, Transaction, TransactionError, TransactionResult, DATE_FORMAT, TIME_FORMAT,
    },
};
