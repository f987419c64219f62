use std::{io, process};
#[macro_use]
extern crate log;

use clap::{Arg, Command};
use ledger_engine::{AccountStore, AccountType, LedgerStore};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// One row of the balance report
#[derive(Serialize, Debug)]
struct BalanceRow<'a> {
    account: &'a str,
    #[serde(rename = "type")]
    account_type: AccountType,
    currency: &'a str,
    #[serde(serialize_with = "plain_decimal")]
    balance: Decimal,
}

/// Writes a balance as plain text without trailing zeros, e.g. `-12.5`.
fn plain_decimal<S>(amount: &Decimal, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.collect_str(&amount.normalize())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let matches = Command::new("ledger-engine")
        .about("Prints every account balance of a ledger as CSV")
        .arg(
            Arg::new("accounts")
                .long("accounts")
                .value_name("PATH")
                .takes_value(true)
                .default_value("accounts.json")
                .help("Accounts file"),
        )
        .arg(
            Arg::new("transactions")
                .long("transactions")
                .value_name("PATH")
                .takes_value(true)
                .default_value("transactions.json")
                .help("Transactions file"),
        )
        .get_matches();

    let accounts_path = matches.value_of("accounts").unwrap_or("accounts.json");
    let transactions_path = matches
        .value_of("transactions")
        .unwrap_or("transactions.json");

    let mut accounts = AccountStore::open(accounts_path)?;
    let ledger = LedgerStore::open(transactions_path, &mut accounts)?;
    info!(
        "{} accounts, {} transactions",
        ledger.accounts().len(),
        ledger.len()
    );
    for (txn, posting) in ledger.unresolved_postings() {
        warn!(
            "{} ({}) references missing account {}",
            txn.description(),
            txn.date(),
            posting.account_name()
        );
    }

    let mut wtr = csv::Writer::from_writer(io::stdout());
    for account in ledger.accounts().accounts().values() {
        for (currency, balance) in account.balances() {
            wtr.serialize(BalanceRow {
                account: account.name(),
                account_type: account.account_type(),
                currency,
                balance: *balance,
            })?;
        }
    }
    wtr.flush()?;

    Ok(())
}
