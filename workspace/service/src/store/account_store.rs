use chrono::Utc;
use model::entities::prelude::*;
use model::entities::{account, bootstrap_marker};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

/// Fields of an account about to be persisted. The hash is already computed.
#[derive(Debug, Clone)]
pub struct NewAccountRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: account::Role,
}

/// Account persistence plus the single-row bootstrap marker.
pub struct AccountStore;

impl AccountStore {
    pub async fn find_by_username<C: ConnectionTrait>(
        conn: &C,
        username: &str,
    ) -> Result<Option<account::Model>, DbErr> {
        Account::find()
            .filter(account::Column::Username.eq(username))
            .one(conn)
            .await
    }

    pub async fn exists_by_username<C: ConnectionTrait>(
        conn: &C,
        username: &str,
    ) -> Result<bool, DbErr> {
        let matches = Account::find()
            .filter(account::Column::Username.eq(username))
            .count(conn)
            .await?;
        Ok(matches > 0)
    }

    pub async fn exists_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> Result<bool, DbErr> {
        let matches = Account::find()
            .filter(account::Column::Email.eq(email))
            .count(conn)
            .await?;
        Ok(matches > 0)
    }

    /// Inserts an active account.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        record: NewAccountRecord,
    ) -> Result<account::Model, DbErr> {
        account::ActiveModel {
            username: Set(record.username),
            email: Set(record.email),
            password_hash: Set(record.password_hash),
            display_name: Set(record.display_name),
            role: Set(record.role),
            active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
        Account::find().count(conn).await
    }

    /// Tries to insert the bootstrap marker row.
    ///
    /// Returns `true` only for the one caller whose insert created the row; every
    /// later (or concurrent, losing) caller gets `false`.
    pub async fn claim_bootstrap<C: ConnectionTrait>(conn: &C) -> Result<bool, DbErr> {
        let inserted = BootstrapMarker::insert(bootstrap_marker::ActiveModel {
            id: Set(bootstrap_marker::MARKER_ID),
            claimed_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::column(bootstrap_marker::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        Ok(inserted == 1)
    }
}
