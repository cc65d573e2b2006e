// src/projecto.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::app_state::AppState;
use crate::export::{projecto_detail, projecto_rows, render_record_pdf, render_table_pdf, PROJECTOS_TABLE};
use crate::models::date_bson;
use crate::models::projecto::{Projecto, StatusProjecto};
use crate::query::{build_live_query, SearchFields, SearchParams};
use crate::roles::{fetch_role, Role};
use crate::validation::validation_error_response;

const SEARCH_FIELDS: SearchFields = SearchFields {
    search: "nome",
    estado: "status",
    criado_em: "criadoEm",
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validar_datas_projecto))]
pub struct CreateProjectoRequest {
    #[validate(length(min = 2, max = 200, message = "O nome deve ter pelo menos 2 caracteres."))]
    pub nome: String,
    #[validate(length(min = 2, max = 50, message = "A referência deve ter pelo menos 2 caracteres."))]
    pub referencia: String,
    #[validate(length(min = 2, max = 500, message = "A descrição deve ter pelo menos 2 caracteres."))]
    pub descricao: String,
    #[validate(length(min = 2, max = 60, message = "O nome do cliente deve ter pelo menos 2 caracteres."))]
    pub cliente_id: String,
    #[validate(length(min = 2, max = 20, message = "O nome do responsável deve ter pelo menos 2 caracteres."))]
    pub responsavel: String,
    #[validate(length(min = 2, max = 50, message = "O departamento deve ter pelo menos 2 caracteres."))]
    pub departamento: String,
    pub status: StatusProjecto,
    pub data_inicio: DateTime<Utc>,
    pub data_fim_prevista: Option<DateTime<Utc>>,
    pub data_fim_real: Option<DateTime<Utc>>,
    #[validate(range(min = 0.01, message = "O valor do orçamento deve ser positivo."))]
    pub valor_orcamento: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "As despesas não podem ser negativas."))]
    pub despesas: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "As receitas não podem ser negativas."))]
    pub receitas: f64,
}

fn validar_datas_projecto(payload: &CreateProjectoRequest) -> Result<(), ValidationError> {
    if let Some(prevista) = &payload.data_fim_prevista {
        if *prevista <= payload.data_inicio {
            return Err(ValidationError::new("dataFimPrevista")
                .with_message("A data de fim prevista deve ser posterior à data de início.".into()));
        }
    }
    if let Some(real) = &payload.data_fim_real {
        if *real < payload.data_inicio {
            return Err(ValidationError::new("dataFimReal")
                .with_message("A data de fim real deve ser posterior à data de início.".into()));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectoRequest {
    #[validate(length(min = 2, max = 200, message = "O nome deve ter pelo menos 2 caracteres."))]
    pub nome: Option<String>,
    #[validate(length(min = 2, max = 50, message = "A referência deve ter pelo menos 2 caracteres."))]
    pub referencia: Option<String>,
    #[validate(length(min = 2, max = 500, message = "A descrição deve ter pelo menos 2 caracteres."))]
    pub descricao: Option<String>,
    #[validate(length(min = 2, max = 60, message = "O nome do cliente deve ter pelo menos 2 caracteres."))]
    pub cliente_id: Option<String>,
    #[validate(length(min = 2, max = 20, message = "O nome do responsável deve ter pelo menos 2 caracteres."))]
    pub responsavel: Option<String>,
    #[validate(length(min = 2, max = 50, message = "O departamento deve ter pelo menos 2 caracteres."))]
    pub departamento: Option<String>,
    pub status: Option<StatusProjecto>,
    pub data_inicio: Option<DateTime<Utc>>,
    pub data_fim_prevista: Option<DateTime<Utc>>,
    pub data_fim_real: Option<DateTime<Utc>>,
    #[validate(range(min = 0.01, message = "O valor do orçamento deve ser positivo."))]
    pub valor_orcamento: Option<f64>,
    #[validate(range(min = 0.0, message = "As despesas não podem ser negativas."))]
    pub despesas: Option<f64>,
    #[validate(range(min = 0.0, message = "As receitas não podem ser negativas."))]
    pub receitas: Option<f64>,
}

/// POST /projectos
pub async fn create_projecto(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateProjectoRequest>,
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

    let new_projecto = Projecto {
        projecto_id: Uuid::new_v4().to_string(),
        nome: payload.nome.clone(),
        referencia: payload.referencia.clone(),
        descricao: payload.descricao.clone(),
        cliente_id: payload.cliente_id.clone(),
        responsavel: payload.responsavel.clone(),
        departamento: payload.departamento.clone(),
        status: payload.status,
        data_inicio: payload.data_inicio,
        data_fim_prevista: payload.data_fim_prevista,
        data_fim_real: payload.data_fim_real,
        valor_orcamento: payload.valor_orcamento,
        despesas: payload.despesas,
        receitas: payload.receitas,
        criado_em: Utc::now(),
        atualizado_em: None,
        criado_por: current_user,
    };

    match data.mongodb.projectos().insert_one(&new_projecto).await {
        Ok(_) => {
            info!("Projecto created: {}", new_projecto.projecto_id);
            HttpResponse::Ok().json(&new_projecto)
        }
        Err(e) => {
            error!("Error inserting projecto: {}", e);
            HttpResponse::InternalServerError().body("Error inserting projecto")
        }
    }
}

/// GET /projectos
pub async fn list_projectos(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.projectos();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching projectos: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching projectos");
        }
    };

    let mut projectos = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(projecto) => projectos.push(projecto),
            Err(e) => {
                error!("Error reading projectos: {}", e);
                return HttpResponse::InternalServerError().body("Error reading projectos");
            }
        }
    }
    HttpResponse::Ok().json(projectos)
}

/// GET /projectos/search?search=&estado=
pub async fn search_projectos(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let live = build_live_query(&params.search, &params.estado, &SEARCH_FIELDS);
    let coll = data.mongodb.projectos();
    let mut find = coll.find(live.filter);
    if let Some(sort) = live.sort {
        find = find.sort(sort);
    }

    let mut cursor = match find.await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error searching projectos: {}", e);
            return HttpResponse::InternalServerError().body("Error searching projectos");
        }
    };

    let mut projectos = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(projecto) => projectos.push(projecto),
            Err(e) => {
                error!("Error reading projectos: {}", e);
                return HttpResponse::InternalServerError().body("Error reading projectos");
            }
        }
    }
    HttpResponse::Ok().json(projectos)
}

/// GET /projectos/{id}
pub async fn get_projecto(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let projecto_id = path.into_inner();
    match data
        .mongodb
        .projectos()
        .find_one(doc! { "projectoId": &projecto_id })
        .await
    {
        Ok(Some(projecto)) => HttpResponse::Ok().json(projecto),
        Ok(None) => HttpResponse::NotFound().body("Projecto not found"),
        Err(e) => {
            error!("Error fetching projecto: {}", e);
            HttpResponse::InternalServerError().body("Error fetching projecto")
        }
    }
}

/// PUT /projectos/{id}
pub async fn update_projecto(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateProjectoRequest>,
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
    if let Some(nome) = &payload.nome {
        set_doc.insert("nome", nome);
    }
    if let Some(referencia) = &payload.referencia {
        set_doc.insert("referencia", referencia);
    }
    if let Some(descricao) = &payload.descricao {
        set_doc.insert("descricao", descricao);
    }
    if let Some(cliente_id) = &payload.cliente_id {
        set_doc.insert("clienteId", cliente_id);
    }
    if let Some(responsavel) = &payload.responsavel {
        set_doc.insert("responsavel", responsavel);
    }
    if let Some(departamento) = &payload.departamento {
        set_doc.insert("departamento", departamento);
    }
    if let Some(status) = &payload.status {
        set_doc.insert("status", status.as_str());
    }
    if let Some(data_inicio) = &payload.data_inicio {
        set_doc.insert("dataInicio", date_bson(data_inicio));
    }
    if let Some(data_fim_prevista) = &payload.data_fim_prevista {
        set_doc.insert("dataFimPrevista", date_bson(data_fim_prevista));
    }
    if let Some(data_fim_real) = &payload.data_fim_real {
        set_doc.insert("dataFimReal", date_bson(data_fim_real));
    }
    if let Some(valor_orcamento) = &payload.valor_orcamento {
        set_doc.insert("valorOrcamento", valor_orcamento);
    }
    if let Some(despesas) = &payload.despesas {
        set_doc.insert("despesas", despesas);
    }
    if let Some(receitas) = &payload.receitas {
        set_doc.insert("receitas", receitas);
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }
    set_doc.insert("atualizadoEm", date_bson(&Utc::now()));

    let projecto_id = path.into_inner();
    match data
        .mongodb
        .projectos()
        .update_one(doc! { "projectoId": &projecto_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("Projecto updated"),
        Ok(_) => HttpResponse::NotFound().body("Projecto not found"),
        Err(e) => {
            error!("Error updating projecto: {}", e);
            HttpResponse::InternalServerError().body("Error updating projecto")
        }
    }
}

/// DELETE /projectos/{id}
pub async fn delete_projecto(
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

    let projecto_id = path.into_inner();
    match data
        .mongodb
        .projectos()
        .delete_one(doc! { "projectoId": &projecto_id })
        .await
    {
        Ok(res) if res.deleted_count == 1 => HttpResponse::Ok().body("Projecto deleted"),
        Ok(_) => HttpResponse::NotFound().body("Projecto not found"),
        Err(e) => {
            error!("Error deleting projecto: {}", e);
            HttpResponse::InternalServerError().body("Error deleting projecto")
        }
    }
}

/// GET /projectos/export
pub async fn export_projectos(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.projectos();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching projectos: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching projectos");
        }
    };
    let mut projectos = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(projecto) => projectos.push(projecto),
            Err(e) => {
                error!("Error reading projectos: {}", e);
                return HttpResponse::InternalServerError().body("Error reading projectos");
            }
        }
    }

    let rows = projecto_rows(&projectos);
    match render_table_pdf(&PROJECTOS_TABLE, &rows, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", PROJECTOS_TABLE.file_name),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating projectos PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

/// GET /projectos/{id}/export
pub async fn export_projecto_ficha(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let projecto_id = path.into_inner();
    let projecto = match data
        .mongodb
        .projectos()
        .find_one(doc! { "projectoId": &projecto_id })
        .await
    {
        Ok(Some(projecto)) => projecto,
        Ok(None) => return HttpResponse::NotFound().body("Projecto not found"),
        Err(e) => {
            error!("Error fetching projecto: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching projecto");
        }
    };

    let title = format!("Detalhes do Projecto - {}", projecto.nome);
    let fields = projecto_detail(&projecto);
    match render_record_pdf(&title, &fields, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"Detalhes_do_projecto_{}.pdf\"", projecto.nome),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating projecto PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_payload() -> CreateProjectoRequest {
        CreateProjectoRequest {
            nome: "Portal do Cliente".to_string(),
            referencia: "PRJ-014".to_string(),
            descricao: "Reformulação do portal".to_string(),
            cliente_id: "Construtora Zambeze".to_string(),
            responsavel: "Elsa Mutombene".to_string(),
            departamento: "Engenharia".to_string(),
            status: StatusProjecto::Planejado,
            data_inicio: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            data_fim_prevista: Some(Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()),
            data_fim_real: None,
            valor_orcamento: 250_000.0,
            despesas: 0.0,
            receitas: 0.0,
        }
    }

    #[test]
    fn a_complete_payload_validates() {
        assert!(base_payload().validate().is_ok());
    }

    #[test]
    fn planned_end_must_come_after_the_start() {
        let mut payload = base_payload();
        payload.data_fim_prevista = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert!(payload.validate().is_err());
    }

    #[test]
    fn budget_must_be_positive() {
        let mut payload = base_payload();
        payload.valor_orcamento = 0.0;
        assert!(payload.validate().is_err());
    }
}
