// src/colaborador.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::export::{
    colaborador_detail, colaborador_rows, render_record_pdf, render_table_pdf,
    COLABORADORES_TABLE,
};
use crate::models::colaborador::{Colaborador, Contrato, EstadoColaborador, Genero};
use crate::models::date_bson;
use crate::query::{build_live_query, SearchFields, SearchParams};
use crate::roles::{fetch_role, Role};
use crate::validation::{validate_telefone, validation_error_response};

const SEARCH_FIELDS: SearchFields = SearchFields {
    search: "nome",
    estado: "estado",
    criado_em: "criadoEm",
};

/// Registration form payload, validated the way the form validated it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateColaboradorRequest {
    #[validate(length(min = 2, max = 100, message = "O nome deve ter pelo menos 2 caracteres."))]
    pub nome: String,
    #[serde(default)]
    pub apelido: String,
    #[validate(
        email(message = "Insira um e-mail válido."),
        length(max = 120, message = "O e-mail não pode ultrapassar 120 caracteres.")
    )]
    pub email: String,
    #[validate(length(min = 2, message = "Informe a função do colaborador."))]
    pub funcao: String,
    #[validate(length(min = 2, message = "Informe o departamento."))]
    pub departamento: String,
    pub contrato: Contrato,
    pub estado: EstadoColaborador,
    pub genero: Genero,
    pub data_nascimento: DateTime<Utc>,
    #[serde(default)]
    #[validate(custom(function = validate_telefone))]
    pub telefone: String,
    #[serde(default)]
    pub morada: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColaboradorRequest {
    #[validate(length(min = 2, max = 100, message = "O nome deve ter pelo menos 2 caracteres."))]
    pub nome: Option<String>,
    pub apelido: Option<String>,
    #[validate(email(message = "Insira um e-mail válido."))]
    pub email: Option<String>,
    #[validate(length(min = 2, message = "Informe a função do colaborador."))]
    pub funcao: Option<String>,
    #[validate(length(min = 2, message = "Informe o departamento."))]
    pub departamento: Option<String>,
    pub contrato: Option<Contrato>,
    pub estado: Option<EstadoColaborador>,
    pub genero: Option<Genero>,
    pub data_nascimento: Option<DateTime<Utc>>,
    #[validate(custom(function = validate_telefone))]
    pub telefone: Option<String>,
    pub morada: Option<String>,
}

/// POST /colaboradores
pub async fn create_colaborador(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateColaboradorRequest>,
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

    let new_colaborador = Colaborador {
        colaborador_id: Uuid::new_v4().to_string(),
        nome: payload.nome.clone(),
        apelido: payload.apelido.clone(),
        email: payload.email.clone(),
        funcao: payload.funcao.clone(),
        departamento: payload.departamento.clone(),
        contrato: payload.contrato,
        estado: payload.estado,
        genero: payload.genero,
        data_nascimento: Some(payload.data_nascimento),
        telefone: payload.telefone.clone(),
        morada: payload.morada.clone(),
        criado_em: Utc::now(),
        atualizado_em: None,
    };

    match data.mongodb.colaboradores().insert_one(&new_colaborador).await {
        Ok(_) => {
            info!("Colaborador created: {}", new_colaborador.colaborador_id);
            HttpResponse::Ok().json(&new_colaborador)
        }
        Err(e) => {
            error!("Error inserting colaborador: {}", e);
            HttpResponse::InternalServerError().body("Error inserting colaborador")
        }
    }
}

/// GET /colaboradores
pub async fn list_colaboradores(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.colaboradores();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching colaboradores: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching colaboradores");
        }
    };

    let mut colaboradores = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(colaborador) => colaboradores.push(colaborador),
            Err(e) => {
                error!("Error reading colaboradores: {}", e);
                return HttpResponse::InternalServerError().body("Error reading colaboradores");
            }
        }
    }
    HttpResponse::Ok().json(colaboradores)
}

/// GET /colaboradores/search?search=&estado=
/// Rebuilds the list for the current search term and status filter.
pub async fn search_colaboradores(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let live = build_live_query(&params.search, &params.estado, &SEARCH_FIELDS);
    let coll = data.mongodb.colaboradores();
    let mut find = coll.find(live.filter);
    if let Some(sort) = live.sort {
        find = find.sort(sort);
    }

    let mut cursor = match find.await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error searching colaboradores: {}", e);
            return HttpResponse::InternalServerError().body("Error searching colaboradores");
        }
    };

    let mut colaboradores = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(colaborador) => colaboradores.push(colaborador),
            Err(e) => {
                error!("Error reading colaboradores: {}", e);
                return HttpResponse::InternalServerError().body("Error reading colaboradores");
            }
        }
    }
    HttpResponse::Ok().json(colaboradores)
}

/// GET /colaboradores/{id}
pub async fn get_colaborador(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let colaborador_id = path.into_inner();
    match data
        .mongodb
        .colaboradores()
        .find_one(doc! { "colaboradorId": &colaborador_id })
        .await
    {
        Ok(Some(colaborador)) => HttpResponse::Ok().json(colaborador),
        Ok(None) => HttpResponse::NotFound().body("Colaborador not found"),
        Err(e) => {
            error!("Error fetching colaborador: {}", e);
            HttpResponse::InternalServerError().body("Error fetching colaborador")
        }
    }
}

/// PUT /colaboradores/{id}
pub async fn update_colaborador(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateColaboradorRequest>,
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
    if let Some(apelido) = &payload.apelido {
        set_doc.insert("apelido", apelido);
    }
    if let Some(email) = &payload.email {
        set_doc.insert("email", email);
    }
    if let Some(funcao) = &payload.funcao {
        set_doc.insert("funcao", funcao);
    }
    if let Some(departamento) = &payload.departamento {
        set_doc.insert("departamento", departamento);
    }
    if let Some(contrato) = &payload.contrato {
        set_doc.insert("contrato", contrato.as_str());
    }
    if let Some(estado) = &payload.estado {
        set_doc.insert("estado", estado.as_str());
    }
    if let Some(genero) = &payload.genero {
        set_doc.insert("genero", genero.as_str());
    }
    if let Some(data_nascimento) = &payload.data_nascimento {
        set_doc.insert("dataNascimento", date_bson(data_nascimento));
    }
    if let Some(telefone) = &payload.telefone {
        set_doc.insert("telefone", telefone);
    }
    if let Some(morada) = &payload.morada {
        set_doc.insert("morada", morada);
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }
    set_doc.insert("atualizadoEm", date_bson(&Utc::now()));

    let colaborador_id = path.into_inner();
    match data
        .mongodb
        .colaboradores()
        .update_one(doc! { "colaboradorId": &colaborador_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("Colaborador updated"),
        Ok(_) => HttpResponse::NotFound().body("Colaborador not found"),
        Err(e) => {
            error!("Error updating colaborador: {}", e);
            HttpResponse::InternalServerError().body("Error updating colaborador")
        }
    }
}

/// DELETE /colaboradores/{id}
/// Hard delete; one backend call for exactly this identifier.
pub async fn delete_colaborador(
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

    let colaborador_id = path.into_inner();
    match data
        .mongodb
        .colaboradores()
        .delete_one(doc! { "colaboradorId": &colaborador_id })
        .await
    {
        Ok(res) if res.deleted_count == 1 => HttpResponse::Ok().body("Colaborador deleted"),
        Ok(_) => HttpResponse::NotFound().body("Colaborador not found"),
        Err(e) => {
            error!("Error deleting colaborador: {}", e);
            HttpResponse::InternalServerError().body("Error deleting colaborador")
        }
    }
}

/// GET /colaboradores/export
pub async fn export_colaboradores(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.colaboradores();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching colaboradores: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching colaboradores");
        }
    };
    let mut colaboradores = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(colaborador) => colaboradores.push(colaborador),
            Err(e) => {
                error!("Error reading colaboradores: {}", e);
                return HttpResponse::InternalServerError().body("Error reading colaboradores");
            }
        }
    }

    let rows = colaborador_rows(&colaboradores);
    match render_table_pdf(&COLABORADORES_TABLE, &rows, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", COLABORADORES_TABLE.file_name),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating colaboradores PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

/// GET /colaboradores/{id}/export
pub async fn export_colaborador_ficha(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let colaborador_id = path.into_inner();
    let colaborador = match data
        .mongodb
        .colaboradores()
        .find_one(doc! { "colaboradorId": &colaborador_id })
        .await
    {
        Ok(Some(colaborador)) => colaborador,
        Ok(None) => return HttpResponse::NotFound().body("Colaborador not found"),
        Err(e) => {
            error!("Error fetching colaborador: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching colaborador");
        }
    };

    let title = format!("Ficha do Colaborador - {}", colaborador.nome);
    let fields = colaborador_detail(&colaborador);
    match render_record_pdf(&title, &fields, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}_ficha.pdf\"", colaborador.nome),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating colaborador PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}
