// src/despesa.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::app_state::AppState;
use crate::export::{despesa_detail, despesa_rows, render_record_pdf, render_table_pdf, DESPESAS_TABLE};
use crate::models::date_bson;
use crate::models::despesa::{Despesa, EstadoDespesa, MetodoPagamento};
use crate::models::CriadoPor;
use crate::query::{build_live_query, SearchFields, SearchParams};
use crate::roles::{fetch_role, Role};
use crate::validation::validation_error_response;

const SEARCH_FIELDS: SearchFields = SearchFields {
    search: "entidade",
    estado: "estado",
    criado_em: "criadoEm",
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validar_datas_despesa))]
pub struct CreateDespesaRequest {
    #[validate(length(min = 1, message = "O nome da entidade é obrigatório."))]
    pub entidade: String,
    #[validate(range(min = 0.01, message = "O valor deve ser positivo!"))]
    pub valor: f64,
    pub metodo_pagamento: MetodoPagamento,
    pub data_emissao: Option<DateTime<Utc>>,
    pub data_vencimento: Option<DateTime<Utc>>,
    pub estado: EstadoDespesa,
    #[validate(length(min = 1, message = "A descrição da despesa é obrigatória."))]
    pub descricao: String,
}

fn validar_datas_despesa(payload: &CreateDespesaRequest) -> Result<(), ValidationError> {
    if let (Some(emissao), Some(vencimento)) = (&payload.data_emissao, &payload.data_vencimento) {
        if vencimento <= emissao {
            return Err(ValidationError::new("dataVencimento")
                .with_message("A data de vencimento deve ser posterior à data de emissão.".into()));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDespesaRequest {
    #[validate(length(min = 1, message = "O nome da entidade é obrigatório."))]
    pub entidade: Option<String>,
    #[validate(range(min = 0.01, message = "O valor deve ser positivo!"))]
    pub valor: Option<f64>,
    pub metodo_pagamento: Option<MetodoPagamento>,
    pub data_emissao: Option<DateTime<Utc>>,
    pub data_vencimento: Option<DateTime<Utc>>,
    pub estado: Option<EstadoDespesa>,
    #[validate(length(min = 1, message = "A descrição da despesa é obrigatória."))]
    pub descricao: Option<String>,
}

/// POST /despesas
pub async fn create_despesa(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateDespesaRequest>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_create) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }
    if let Err(errors) = payload.validate() {
        return validation_error_response(errors);
    }

    // Snapshot the creator's display name into the document.
    let criador_nome = data
        .mongodb
        .users()
        .find_one(doc! { "userId": &current_user })
        .await
        .ok()
        .flatten()
        .map(|user| user.name)
        .unwrap_or_default();

    let new_despesa = Despesa {
        despesa_id: Uuid::new_v4().to_string(),
        entidade: payload.entidade.clone(),
        valor: payload.valor,
        metodo_pagamento: payload.metodo_pagamento,
        data_emissao: payload.data_emissao,
        data_vencimento: payload.data_vencimento,
        estado: payload.estado,
        descricao: payload.descricao.clone(),
        criado_em: Utc::now(),
        atualizado_em: None,
        criado_por: CriadoPor {
            uid: current_user,
            nome: criador_nome,
        },
    };

    match data.mongodb.despesas().insert_one(&new_despesa).await {
        Ok(_) => {
            info!("Despesa created: {}", new_despesa.despesa_id);
            HttpResponse::Ok().json(&new_despesa)
        }
        Err(e) => {
            error!("Error inserting despesa: {}", e);
            HttpResponse::InternalServerError().body("Error inserting despesa")
        }
    }
}

/// GET /despesas
pub async fn list_despesas(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.despesas();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching despesas: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching despesas");
        }
    };

    let mut despesas = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(despesa) => despesas.push(despesa),
            Err(e) => {
                error!("Error reading despesas: {}", e);
                return HttpResponse::InternalServerError().body("Error reading despesas");
            }
        }
    }
    HttpResponse::Ok().json(despesas)
}

/// GET /despesas/search?search=&estado=
pub async fn search_despesas(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let live = build_live_query(&params.search, &params.estado, &SEARCH_FIELDS);
    let coll = data.mongodb.despesas();
    let mut find = coll.find(live.filter);
    if let Some(sort) = live.sort {
        find = find.sort(sort);
    }

    let mut cursor = match find.await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error searching despesas: {}", e);
            return HttpResponse::InternalServerError().body("Error searching despesas");
        }
    };

    let mut despesas = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(despesa) => despesas.push(despesa),
            Err(e) => {
                error!("Error reading despesas: {}", e);
                return HttpResponse::InternalServerError().body("Error reading despesas");
            }
        }
    }
    HttpResponse::Ok().json(despesas)
}

/// GET /despesas/{id}
pub async fn get_despesa(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let despesa_id = path.into_inner();
    match data
        .mongodb
        .despesas()
        .find_one(doc! { "despesaId": &despesa_id })
        .await
    {
        Ok(Some(despesa)) => HttpResponse::Ok().json(despesa),
        Ok(None) => HttpResponse::NotFound().body("Despesa not found"),
        Err(e) => {
            error!("Error fetching despesa: {}", e);
            HttpResponse::InternalServerError().body("Error fetching despesa")
        }
    }
}

/// PUT /despesas/{id}
pub async fn update_despesa(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateDespesaRequest>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_edit) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }
    if let Err(errors) = payload.validate() {
        return validation_error_response(errors);
    }

    let mut set_doc = doc! {};
    if let Some(entidade) = &payload.entidade {
        set_doc.insert("entidade", entidade);
    }
    if let Some(valor) = &payload.valor {
        set_doc.insert("valor", valor);
    }
    if let Some(metodo_pagamento) = &payload.metodo_pagamento {
        set_doc.insert("metodoPagamento", metodo_pagamento.as_str());
    }
    if let Some(data_emissao) = &payload.data_emissao {
        set_doc.insert("dataEmissao", date_bson(data_emissao));
    }
    if let Some(data_vencimento) = &payload.data_vencimento {
        set_doc.insert("dataVencimento", date_bson(data_vencimento));
    }
    if let Some(estado) = &payload.estado {
        set_doc.insert("estado", estado.as_str());
    }
    if let Some(descricao) = &payload.descricao {
        set_doc.insert("descricao", descricao);
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }
    set_doc.insert("atualizadoEm", date_bson(&Utc::now()));

    let despesa_id = path.into_inner();
    match data
        .mongodb
        .despesas()
        .update_one(doc! { "despesaId": &despesa_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("Despesa updated"),
        Ok(_) => HttpResponse::NotFound().body("Despesa not found"),
        Err(e) => {
            error!("Error updating despesa: {}", e);
            HttpResponse::InternalServerError().body("Error updating despesa")
        }
    }
}

/// DELETE /despesas/{id}
pub async fn delete_despesa(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_delete) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let despesa_id = path.into_inner();
    match data
        .mongodb
        .despesas()
        .delete_one(doc! { "despesaId": &despesa_id })
        .await
    {
        Ok(res) if res.deleted_count == 1 => HttpResponse::Ok().body("Despesa deleted"),
        Ok(_) => HttpResponse::NotFound().body("Despesa not found"),
        Err(e) => {
            error!("Error deleting despesa: {}", e);
            HttpResponse::InternalServerError().body("Error deleting despesa")
        }
    }
}

/// GET /despesas/export
pub async fn export_despesas(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.despesas();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching despesas: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching despesas");
        }
    };
    let mut despesas = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(despesa) => despesas.push(despesa),
            Err(e) => {
                error!("Error reading despesas: {}", e);
                return HttpResponse::InternalServerError().body("Error reading despesas");
            }
        }
    }

    let rows = despesa_rows(&despesas);
    match render_table_pdf(&DESPESAS_TABLE, &rows, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", DESPESAS_TABLE.file_name),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating despesas PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

/// GET /despesas/{id}/export
pub async fn export_despesa_ficha(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let despesa_id = path.into_inner();
    let despesa = match data
        .mongodb
        .despesas()
        .find_one(doc! { "despesaId": &despesa_id })
        .await
    {
        Ok(Some(despesa)) => despesa,
        Ok(None) => return HttpResponse::NotFound().body("Despesa not found"),
        Err(e) => {
            error!("Error fetching despesa: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching despesa");
        }
    };

    let title = format!("Detalhes da Despesa - {}", despesa.entidade);
    let fields = despesa_detail(&despesa);
    match render_record_pdf(&title, &fields, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"Detalhes_da_despesa_{}.pdf\"", despesa.entidade),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating despesa PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_date_may_not_precede_the_issue_date() {
        let payload = CreateDespesaRequest {
            entidade: "EDM".to_string(),
            valor: 100.0,
            metodo_pagamento: MetodoPagamento::Dinheiro,
            data_emissao: Some(Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap()),
            data_vencimento: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            estado: EstadoDespesa::Pendente,
            descricao: "Energia".to_string(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn missing_dates_skip_the_order_check() {
        let payload = CreateDespesaRequest {
            entidade: "EDM".to_string(),
            valor: 100.0,
            metodo_pagamento: MetodoPagamento::Cartao,
            data_emissao: None,
            data_vencimento: None,
            estado: EstadoDespesa::Pago,
            descricao: "Energia".to_string(),
        };
        assert!(payload.validate().is_ok());
    }
}
