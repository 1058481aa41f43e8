use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upstream")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub health_url: Option<String>,
    pub active: bool,
    /// Optimistic concurrency counter, bumped on every successful save.
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation { fn def(&self) -> RelationDef { panic!("no relations") } }

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    Ok(())
}

pub fn validate_base_url(base_url: &str) -> Result<(), errors::ModelError> {
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(errors::ModelError::Validation("invalid base_url".into()));
    }
    Ok(())
}
