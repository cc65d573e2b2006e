use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contrato {
    Efetivo,
    #[serde(rename = "Temporário")]
    Temporario,
    #[serde(rename = "Estagiário")]
    Estagiario,
}

impl Contrato {
    pub fn as_str(&self) -> &'static str {
        match self {
            Contrato::Efetivo => "Efetivo",
            Contrato::Temporario => "Temporário",
            Contrato::Estagiario => "Estagiário",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoColaborador {
    Ativo,
    Inativo,
}

impl EstadoColaborador {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoColaborador::Ativo => "Ativo",
            EstadoColaborador::Inativo => "Inativo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genero {
    Masculino,
    Feminino,
}

impl Genero {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genero::Masculino => "Masculino",
            Genero::Feminino => "Feminino",
        }
    }
}

/// An employee record in the `colaboradores` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Colaborador {
    pub colaborador_id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub apelido: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub funcao: String,
    #[serde(default)]
    pub departamento: String,
    pub contrato: Contrato,
    pub estado: EstadoColaborador,
    pub genero: Genero,
    pub data_nascimento: Option<DateTime<Utc>>,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub morada: String,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn colaborador_keeps_the_document_field_names() {
        let colaborador = Colaborador {
            colaborador_id: "c-1".to_string(),
            nome: "Ana".to_string(),
            apelido: "Macamo".to_string(),
            email: "ana@gestao.dev".to_string(),
            funcao: "Designer".to_string(),
            departamento: "Marketing".to_string(),
            contrato: Contrato::Temporario,
            estado: EstadoColaborador::Ativo,
            genero: Genero::Feminino,
            data_nascimento: None,
            telefone: "+258 84 000 0000".to_string(),
            morada: String::new(),
            criado_em: Utc::now(),
            atualizado_em: None,
        };

        let json = serde_json::to_value(&colaborador).unwrap();
        assert_eq!(json["colaboradorId"], "c-1");
        assert_eq!(json["contrato"], "Temporário");
        assert_eq!(json["estado"], "Ativo");
        assert!(json.get("criadoEm").is_some());
    }

    #[test]
    fn missing_display_fields_fall_back_to_empty_strings() {
        let raw = serde_json::json!({
            "colaboradorId": "c-2",
            "contrato": "Efetivo",
            "estado": "Inativo",
            "genero": "Masculino",
            "dataNascimento": null,
            "criadoEm": Utc::now(),
            "atualizadoEm": null,
        });

        let colaborador: Colaborador = serde_json::from_value(raw).unwrap();
        assert_eq!(colaborador.nome, "");
        assert_eq!(colaborador.telefone, "");
        assert_eq!(colaborador.estado, EstadoColaborador::Inativo);
    }
}
