use std::sync::Arc;

use model::entities::account::Role;
use sea_orm::{DatabaseConnection, DbErr, SqlErr, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::password::CredentialHasher;
use crate::store::{AccountStore, NewAccountRecord};
use crate::views::{AccountCredentials, AccountView};

/// Registration input. `password` is plaintext and is only ever handed to the hasher.
#[derive(Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Registration and credential lookup.
///
/// The first account ever registered becomes [`Role::Admin`]; everyone after that
/// is [`Role::Secretaria`]. The decision is made inside the registration
/// transaction and guarded by the bootstrap marker row, so two concurrent first
/// registrations cannot both end up as admin.
#[derive(Clone)]
pub struct AccountService {
    db: DatabaseConnection,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    pub fn new(db: DatabaseConnection, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { db, hasher }
    }

    /// Credentials of `username` for the login pipeline to verify.
    #[instrument(skip(self))]
    pub async fn authenticate(&self, username: &str) -> Result<AccountCredentials> {
        let account = AccountStore::find_by_username(&self.db, username)
            .await?
            .ok_or_else(|| ServiceError::unknown_user(username))?;
        debug!("Loaded credentials for {}", username);
        Ok(AccountCredentials::from(account))
    }

    #[instrument(skip(self), fields(username = %new_account.username))]
    pub async fn register(&self, new_account: NewAccount) -> Result<AccountView> {
        let txn = self.db.begin().await?;

        if AccountStore::exists_by_username(&txn, &new_account.username).await? {
            warn!("Username {} is already taken", new_account.username);
            return Err(ServiceError::DuplicateKey {
                field: "username",
                message: "Username is already taken".to_string(),
            });
        }
        if AccountStore::exists_by_email(&txn, &new_account.email).await? {
            warn!("Email of {} is already registered", new_account.username);
            return Err(ServiceError::DuplicateKey {
                field: "email",
                message: "Email is already registered".to_string(),
            });
        }

        let password_hash = self.hasher.hash(&new_account.password)?;

        let existing = AccountStore::count(&txn).await?;
        let role = if existing == 0 && AccountStore::claim_bootstrap(&txn).await? {
            Role::Admin
        } else {
            Role::Secretaria
        };

        let created = AccountStore::insert(
            &txn,
            NewAccountRecord {
                username: new_account.username,
                email: new_account.email,
                password_hash,
                display_name: new_account.display_name,
                role,
            },
        )
        .await
        .map_err(duplicate_account)?;
        txn.commit().await?;

        info!("Registered {} as {}", created.username, created.role);
        Ok(AccountView::from(created))
    }

    /// Total registered accounts.
    pub async fn count(&self) -> Result<u64> {
        Ok(AccountStore::count(&self.db).await?)
    }

    /// Whether the next registration would be granted ADMIN.
    pub async fn is_first_registration(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    pub fn hasher(&self) -> &Arc<dyn CredentialHasher> {
        &self.hasher
    }
}

/// A concurrent registration can pass the existence checks and still lose on the unique index.
fn duplicate_account(err: DbErr) -> ServiceError {
    let email_taken = matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(ref detail)) if detail.contains("email")
    );
    if email_taken {
        ServiceError::duplicate_or_db(err, "email", "Email is already registered")
    } else {
        ServiceError::duplicate_or_db(err, "username", "Username is already taken")
    }
}
