use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Currency code to signed amount. Iteration order is insertion order.
pub type Amounts = IndexMap<String, Decimal>;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    #[error("Account {0} already exists")]
    AlreadyExists(String),

    #[error("Account {0} not found")]
    NotFound(String),

    #[error("Invalid format - unrecognized account type {0:?}")]
    InvalidFormat(String),

    #[error("Unable to persist accounts - {0:#}")]
    Persistence(#[from] anyhow::Error),
}

pub type AccountResult<T> = anyhow::Result<T, AccountError>;

/// Classification of an account. Governs how its balance contributes to reports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Asset,
    Liability,
    Expense,
    Income,
    Equity,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Expense,
        AccountType::Income,
        AccountType::Equity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Expense => "Expense",
            AccountType::Income => "Income",
            AccountType::Equity => "Equity",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = AccountError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| AccountError::InvalidFormat(tag.to_string()))
    }
}

/// On-disk shape of an account: `{"type": .., "name": .., "balances": {..}}`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccountRecord {
    #[serde(rename = "type")]
    account_type: String,
    name: String,
    #[serde(default)]
    balances: Amounts,
}

/// A named ledger account holding a balance per currency.
/// A currency missing from `balances` has a zero balance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    account_type: AccountType,
    name: String,
    balances: Amounts,
}

impl Account {
    pub fn new(account_type: AccountType, name: impl Into<String>) -> AccountResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AccountError::InvalidArgument(
                "account name cannot be empty".into(),
            ));
        }

        Ok(Self {
            account_type,
            name,
            balances: Amounts::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balances(&self) -> &Amounts {
        &self.balances
    }

    /// Balance in `currency`, zero when the account never saw it.
    pub fn balance(&self, currency: &str) -> Decimal {
        self.balances.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn add_balance(&mut self, currency: &str, amount: Decimal) -> AccountResult<()> {
        if currency.is_empty() {
            return Err(AccountError::InvalidArgument(
                "currency cannot be empty".into(),
            ));
        }

        *self
            .balances
            .entry(currency.to_string())
            .or_insert(Decimal::ZERO) += amount;
        Ok(())
    }

    /// Sets whichever of name/type is given. Empty names are ignored; balances are untouched.
    pub fn edit(&mut self, new_name: Option<&str>, new_type: Option<AccountType>) {
        if let Some(name) = new_name.filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(account_type) = new_type {
            self.account_type = account_type;
        }
    }
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let mut account = Account::new(record.account_type.parse()?, record.name)?;
        account.balances = record.balances;
        Ok(account)
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        Self {
            account_type: account.account_type.to_string(),
            name: account.name,
            balances: account.balances,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let balances = self
            .balances
            .iter()
            .map(|(currency, amount)| format!("{currency}: {amount}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Account Name: {}, Type: {}, Balances: {}",
            self.name, self.account_type, balances
        )
    }
}
