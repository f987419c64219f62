use super::{
    account::Amounts,
    persist,
    store::AccountStore,
    transaction::{
        Posting, Transaction, TransactionError, TransactionResult, DATE_FORMAT, TIME_FORMAT,
    },
};
use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

/// Append-only log of transactions, applied to the accounts of a borrowed
/// [`AccountStore`] and persisted after every append.
#[derive(Debug)]
pub struct LedgerStore<'a> {
    path: PathBuf,
    accounts: &'a mut AccountStore,
    transactions: Vec<Transaction>,
}

impl<'a> LedgerStore<'a> {
    /// Opens the log backed by `path`. Postings are resolved against `accounts`.
    pub fn open(
        path: impl Into<PathBuf>,
        accounts: &'a mut AccountStore,
    ) -> TransactionResult<Self> {
        let mut ledger = Self {
            path: path.into(),
            accounts,
            transactions: Vec::new(),
        };
        ledger.load()?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory log with the file's content. A missing or
    /// malformed file leaves the log empty. Postings naming an account that no
    /// longer exists are kept and flagged as unresolved.
    pub fn load(&mut self) -> TransactionResult<()> {
        self.transactions = persist::load_or_default(&self.path)?;

        for txn in &mut self.transactions {
            let (date, description) = (txn.date(), txn.description().to_string());
            for posting in txn.postings_mut() {
                let resolved = self.accounts.contains(posting.account_name());
                if !resolved {
                    warn!(
                        "transaction {:?} on {} posts to unknown account {}",
                        description,
                        date,
                        posting.account_name()
                    );
                }
                posting.set_resolved(resolved);
            }
        }

        debug!(
            "loaded {} transactions from {}",
            self.transactions.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn save(&self) -> TransactionResult<()> {
        persist::save(&self.path, &self.transactions)?;
        Ok(())
    }

    /// Validates, applies and records a transaction.
    ///
    /// The balance law, currency codes and every account name are checked
    /// before any balance changes. If writing either file fails, the balances
    /// and the log are put back as they were, so a failed call leaves both
    /// untouched and can be retried.
    pub fn add_transaction<S>(
        &mut self,
        date: &str,
        time: &str,
        description: &str,
        postings: Vec<(S, Amounts)>,
    ) -> TransactionResult<&Transaction>
    where
        S: Into<String>,
    {
        if date.is_empty() || time.is_empty() || description.is_empty() {
            return Err(TransactionError::InvalidArgument(
                "date, time and description are required for a transaction".into(),
            ));
        }
        if postings.is_empty() {
            return Err(TransactionError::InvalidArgument(
                "at least one posting is required for a transaction".into(),
            ));
        }

        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| {
            TransactionError::InvalidArgument(format!("date {date:?} is not YYYY-MM-DD: {e}"))
        })?;
        let time = NaiveTime::parse_from_str(time, TIME_FORMAT).map_err(|e| {
            TransactionError::InvalidArgument(format!("time {time:?} is not HH:MM:SS: {e}"))
        })?;
        let postings = postings
            .into_iter()
            .map(|(account, amounts)| Posting::new(account, amounts))
            .collect();

        let txn = Transaction::new(date, time, description, postings);
        let snapshot = self.accounts.accounts.clone();
        txn.register(&mut self.accounts.accounts)?;
        self.transactions.push(txn);

        if let Err(e) = self.persist_last() {
            self.transactions.pop();
            self.accounts.accounts = snapshot;
            if let Err(undo) = self.accounts.save() {
                warn!("unable to restore {}: {undo}", self.accounts.path().display());
            }
            return Err(e);
        }
        info!("recorded transaction {description:?} on {date}");

        Ok(&self.transactions[self.transactions.len() - 1])
    }

    /// Writes the accounts touched by the newest transaction, then the log.
    fn persist_last(&self) -> TransactionResult<()> {
        if let Some(txn) = self.transactions.last() {
            let touched: IndexSet<&str> =
                txn.postings().iter().map(Posting::account_name).collect();
            for name in touched {
                self.accounts.touch(name)?;
            }
        }
        self.save()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions dated within `start..=end`, in log order.
    pub fn transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions
            .iter()
            .filter(move |txn| (start..=end).contains(&txn.date()))
    }

    /// Postings whose account could not be found when the log was loaded.
    pub fn unresolved_postings(&self) -> impl Iterator<Item = (&Transaction, &Posting)> + '_ {
        self.transactions.iter().flat_map(|txn| {
            txn.postings()
                .iter()
                .filter(|posting| !posting.is_resolved())
                .map(move |posting| (txn, posting))
        })
    }

    pub fn accounts(&self) -> &AccountStore {
        &*self.accounts
    }

    /// The account store stays usable while the ledger is open, e.g. to
    /// create an account before posting to it.
    pub fn accounts_mut(&mut self) -> &mut AccountStore {
        &mut *self.accounts
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
