use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub reference: String,
    pub amount: i64,
    pub channel: Option<String>,
    pub customer_email: Option<String>,
    pub status: String,
    pub metadata: Json,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub processed: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
