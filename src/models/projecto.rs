use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusProjecto {
    Planejado,
    #[serde(rename = "Em Andamento")]
    EmAndamento,
    #[serde(rename = "Concluído")]
    Concluido,
    Pausado,
}

impl StatusProjecto {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusProjecto::Planejado => "Planejado",
            StatusProjecto::EmAndamento => "Em Andamento",
            StatusProjecto::Concluido => "Concluído",
            StatusProjecto::Pausado => "Pausado",
        }
    }
}

/// A project in the `projectos` collection. `cliente_id` carries the client
/// *name*, and `responsavel` a person name, both denormalised strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projecto {
    pub projecto_id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub referencia: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub cliente_id: String,
    #[serde(default)]
    pub responsavel: String,
    #[serde(default)]
    pub departamento: String,
    pub status: StatusProjecto,
    pub data_inicio: DateTime<Utc>,
    pub data_fim_prevista: Option<DateTime<Utc>>,
    pub data_fim_real: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valor_orcamento: f64,
    #[serde(default)]
    pub despesas: f64,
    #[serde(default)]
    pub receitas: f64,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: Option<DateTime<Utc>>,
    #[serde(default)]
    pub criado_por: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_accented_labels() {
        assert_eq!(
            serde_json::to_value(StatusProjecto::EmAndamento).unwrap(),
            "Em Andamento"
        );
        assert_eq!(
            serde_json::to_value(StatusProjecto::Concluido).unwrap(),
            "Concluído"
        );

        let parsed: StatusProjecto = serde_json::from_value("Pausado".into()).unwrap();
        assert_eq!(parsed, StatusProjecto::Pausado);
    }
}
