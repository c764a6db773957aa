use sea_orm::entity::prelude::*;

/// Primary key of the only row this table may ever hold.
pub const MARKER_ID: i32 = 1;

/// Single-row marker recording that the first administrator has been created.
///
/// Registration inserts [`MARKER_ID`] with `ON CONFLICT DO NOTHING` inside its
/// transaction, so at most one registration can ever be granted the ADMIN role
/// by the bootstrap rule.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bootstrap_marker")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub claimed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
