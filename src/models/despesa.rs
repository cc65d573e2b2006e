use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CriadoPor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoDespesa {
    Pago,
    Pendente,
    Cancelada,
}

impl EstadoDespesa {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoDespesa::Pago => "Pago",
            EstadoDespesa::Pendente => "Pendente",
            EstadoDespesa::Cancelada => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetodoPagamento {
    Dinheiro,
    #[serde(rename = "Transferência")]
    Transferencia,
    #[serde(rename = "Cartão")]
    Cartao,
}

impl MetodoPagamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetodoPagamento::Dinheiro => "Dinheiro",
            MetodoPagamento::Transferencia => "Transferência",
            MetodoPagamento::Cartao => "Cartão",
        }
    }
}

/// An outgoing payment in the `despesas` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Despesa {
    pub despesa_id: String,
    #[serde(default)]
    pub entidade: String,
    #[serde(default)]
    pub valor: f64,
    pub metodo_pagamento: MetodoPagamento,
    pub data_emissao: Option<DateTime<Utc>>,
    pub data_vencimento: Option<DateTime<Utc>>,
    pub estado: EstadoDespesa,
    #[serde(default)]
    pub descricao: String,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: Option<DateTime<Utc>>,
    #[serde(default)]
    pub criado_por: CriadoPor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn despesa_round_trips_through_the_wire_names() {
        let despesa = Despesa {
            despesa_id: "d-1".to_string(),
            entidade: "EDM".to_string(),
            valor: 1500.0,
            metodo_pagamento: MetodoPagamento::Transferencia,
            data_emissao: Some(Utc::now()),
            data_vencimento: None,
            estado: EstadoDespesa::Pendente,
            descricao: "Energia do escritório".to_string(),
            criado_em: Utc::now(),
            atualizado_em: None,
            criado_por: CriadoPor {
                uid: "u-1".to_string(),
                nome: "Carlos".to_string(),
            },
        };

        let json = serde_json::to_value(&despesa).unwrap();
        assert_eq!(json["despesaId"], "d-1");
        assert_eq!(json["metodoPagamento"], "Transferência");
        assert_eq!(json["criadoPor"]["nome"], "Carlos");

        let back: Despesa = serde_json::from_value(json).unwrap();
        assert_eq!(back.estado, EstadoDespesa::Pendente);
        assert_eq!(back.valor, 1500.0);
    }
}
