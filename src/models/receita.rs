use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CriadoPor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoriaReceita {
    #[serde(rename = "Mensalidade de Cursos")]
    MensalidadeDeCursos,
    Projetos,
    #[serde(rename = "Outras Receitas")]
    OutrasReceitas,
}

impl CategoriaReceita {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoriaReceita::MensalidadeDeCursos => "Mensalidade de Cursos",
            CategoriaReceita::Projetos => "Projetos",
            CategoriaReceita::OutrasReceitas => "Outras Receitas",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoReceita {
    Recebida,
    Pendente,
    Cancelada,
}

impl EstadoReceita {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoReceita::Recebida => "Recebida",
            EstadoReceita::Pendente => "Pendente",
            EstadoReceita::Cancelada => "Cancelada",
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
    #[serde(rename = "Conta Móvel")]
    ContaMovel,
}

impl MetodoPagamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetodoPagamento::Dinheiro => "Dinheiro",
            MetodoPagamento::Transferencia => "Transferência",
            MetodoPagamento::Cartao => "Cartão",
            MetodoPagamento::ContaMovel => "Conta Móvel",
        }
    }
}

/// An incoming payment in the `receitas` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receita {
    pub receita_id: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub valor: f64,
    pub categoria: CategoriaReceita,
    pub data: Option<DateTime<Utc>>,
    pub metodo_pagamento: MetodoPagamento,
    pub estado: EstadoReceita,
    #[serde(default)]
    pub observacoes: String,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: Option<DateTime<Utc>>,
    #[serde(default)]
    pub criado_por: CriadoPor,
}
