// src/models/mod.rs

pub mod colaborador;
pub mod despesa;
pub mod projecto;
pub mod receita;
pub mod user;

use chrono::{DateTime, Utc};
use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// Creator snapshot embedded in financial documents. The uid and name are
/// denormalised copies, never a reference into `users`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CriadoPor {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub nome: String,
}

/// Dates go into `$set` documents the same way serde writes them at insert
/// time, so chronological sorts stay consistent across create and update.
pub fn date_bson(value: &DateTime<Utc>) -> Bson {
    to_bson(value).unwrap_or_else(|_| Bson::String(value.to_rfc3339()))
}
