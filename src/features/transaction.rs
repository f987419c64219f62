use super::account::{Account, AccountError, Amounts};
use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    #[error("Invalid transaction - postings do not balance to zero for {0}")]
    InvalidTransaction(String),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Unable to persist transactions - {0:#}")]
    Persistence(#[from] anyhow::Error),
}

pub type TransactionResult<T> = anyhow::Result<T, TransactionError>;

/// One line of a transaction. The account is referenced by name and resolved
/// against the account store when the transaction is applied or loaded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Posting {
    #[serde(rename = "account")]
    account_name: String,
    amounts: Amounts,

    /// Cleared at load time when the named account no longer exists
    #[serde(skip, default = "resolved_by_default")]
    resolved: bool,
}

fn resolved_by_default() -> bool {
    true
}

impl Posting {
    pub fn new(account_name: impl Into<String>, amounts: Amounts) -> Self {
        Self {
            account_name: account_name.into(),
            amounts,
            resolved: true,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn amounts(&self) -> &Amounts {
        &self.amounts
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn set_resolved(&mut self, resolved: bool) {
        self.resolved = resolved;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    date: NaiveDate,
    #[serde(with = "hms")]
    time: NaiveTime,
    description: String,
    postings: Vec<Posting>,
}

impl Transaction {
    /// Stores the fields as given. Balance is checked separately, see [`Transaction::is_valid`].
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        description: impl Into<String>,
        postings: Vec<Posting>,
    ) -> Self {
        Self {
            date,
            time,
            description: description.into(),
            postings,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub(crate) fn postings_mut(&mut self) -> &mut [Posting] {
        &mut self.postings
    }

    pub fn add_posting(&mut self, account_name: impl Into<String>, amounts: Amounts) {
        self.postings.push(Posting::new(account_name, amounts));
    }

    /// Signed total per currency across all postings, in first-seen order.
    pub fn totals(&self) -> Amounts {
        let mut totals = Amounts::new();
        for posting in &self.postings {
            for (currency, amount) in &posting.amounts {
                *totals.entry(currency.clone()).or_insert(dec!(0)) += *amount;
            }
        }
        totals
    }

    /// True when every currency sums to exactly zero.
    pub fn is_valid(&self) -> bool {
        self.totals().values().all(Decimal::is_zero)
    }

    /// Checks everything that could stop the postings from being applied:
    /// the balance law, currency codes and that each named account exists.
    pub fn validate(&self, accounts: &IndexMap<String, Account>) -> TransactionResult<()> {
        if let Some((currency, total)) = self.totals().into_iter().find(|(_, t)| !t.is_zero()) {
            return Err(TransactionError::InvalidTransaction(format!(
                "{currency} (off by {total})"
            )));
        }

        for posting in &self.postings {
            if posting.amounts.keys().any(String::is_empty) {
                return Err(TransactionError::InvalidArgument(format!(
                    "posting to {} has an empty currency",
                    posting.account_name
                )));
            }
            if !accounts.contains_key(&posting.account_name) {
                return Err(AccountError::NotFound(posting.account_name.clone()).into());
            }
        }
        Ok(())
    }

    /// Adds every posting's amounts to the named accounts. Nothing is changed
    /// unless the whole transaction validates first.
    pub fn register(&self, accounts: &mut IndexMap<String, Account>) -> TransactionResult<()> {
        self.validate(accounts)?;

        for posting in &self.postings {
            let account = accounts
                .get_mut(&posting.account_name)
                .ok_or_else(|| AccountError::NotFound(posting.account_name.clone()))?;
            for (currency, amount) in &posting.amounts {
                account.add_balance(currency, *amount)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Date: {}, Time: {}, Description: {}, Postings:",
            self.date.format(DATE_FORMAT),
            self.time.format(TIME_FORMAT),
            self.description
        )?;
        for posting in &self.postings {
            let amounts = posting
                .amounts
                .iter()
                .map(|(currency, amount)| format!("{currency}: {amount}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "\n{} {{{}}}", posting.account_name, amounts)?;
        }
        Ok(())
    }
}

/// Wall-clock time as `HH:MM:SS`.
mod hms {
    use super::TIME_FORMAT;
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(de::Error::custom)
    }
}
