use super::{
    account::{Account, AccountError, AccountResult, AccountType},
    persist,
};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Owns every account, keyed by name, and keeps the accounts file in sync.
/// Every mutation is persisted before it returns.
#[derive(Debug)]
pub struct AccountStore {
    path: PathBuf,
    pub(crate) accounts: IndexMap<String, Account>,
}

impl AccountStore {
    /// Opens the store backed by `path`, loading whatever it already holds.
    pub fn open(path: impl Into<PathBuf>) -> AccountResult<Self> {
        let mut store = Self {
            path: path.into(),
            accounts: IndexMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory accounts with the file's content. A missing or
    /// malformed file leaves the store empty.
    pub fn load(&mut self) -> AccountResult<()> {
        let accounts: IndexMap<String, Account> = persist::load_or_default(&self.path)?;
        self.accounts = accounts
            .into_values()
            .map(|account| (account.name().to_string(), account))
            .collect();
        debug!(
            "loaded {} accounts from {}",
            self.accounts.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn save(&self) -> AccountResult<()> {
        persist::save(&self.path, &self.accounts)?;
        Ok(())
    }

    pub fn create(&mut self, account_type: AccountType, name: &str) -> AccountResult<&Account> {
        if self.accounts.contains_key(name) {
            return Err(AccountError::AlreadyExists(name.to_string()));
        }

        let account = Account::new(account_type, name)?;
        self.accounts.insert(name.to_string(), account);
        self.save()?;
        info!("created {account_type} account {name}");
        Ok(&self.accounts[name])
    }

    /// Renames and/or retypes `name`. A rename keeps the account's position
    /// and balances; renaming onto another existing account is rejected.
    pub fn edit(
        &mut self,
        name: &str,
        new_name: Option<&str>,
        new_type: Option<AccountType>,
    ) -> AccountResult<()> {
        if !self.accounts.contains_key(name) {
            return Err(AccountError::NotFound(name.to_string()));
        }
        let new_name = new_name.filter(|n| !n.is_empty() && *n != name);
        if let Some(new_name) = new_name {
            if self.accounts.contains_key(new_name) {
                return Err(AccountError::AlreadyExists(new_name.to_string()));
            }
        }

        let (index, _, mut account) = self
            .accounts
            .shift_remove_full(name)
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;
        account.edit(new_name, new_type);
        self.accounts
            .shift_insert(index, account.name().to_string(), account);

        self.save()?;
        info!("edited account {name}");
        Ok(())
    }

    /// Persists the store after an account's balances changed in place.
    pub fn touch(&self, name: &str) -> AccountResult<()> {
        if !self.accounts.contains_key(name) {
            return Err(AccountError::NotFound(name.to_string()));
        }
        self.save()
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    /// Names in store order, not sorted.
    pub fn list_names(&self) -> Vec<&str> {
        self.accounts.keys().map(String::as_str).collect()
    }

    pub fn accounts(&self) -> &IndexMap<String, Account> {
        &self.accounts
    }

    pub fn accounts_of_type(
        &self,
        account_type: AccountType,
    ) -> impl Iterator<Item = &Account> + '_ {
        self.accounts
            .values()
            .filter(move |account| account.account_type() == account_type)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
