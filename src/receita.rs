// src/receita.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::export::{receita_detail, receita_rows, render_record_pdf, render_table_pdf, RECEITAS_TABLE};
use crate::models::date_bson;
use crate::models::receita::{CategoriaReceita, EstadoReceita, MetodoPagamento, Receita};
use crate::models::CriadoPor;
use crate::query::{build_live_query, SearchFields, SearchParams};
use crate::roles::{fetch_role, Role};
use crate::validation::validation_error_response;

const SEARCH_FIELDS: SearchFields = SearchFields {
    search: "categoria",
    estado: "estado",
    criado_em: "criadoEm",
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceitaRequest {
    #[validate(length(min = 1, message = "A descrição da receita é obrigatória."))]
    pub descricao: String,
    #[validate(range(min = 0.01, message = "O valor deve ser positivo."))]
    pub valor: f64,
    pub categoria: CategoriaReceita,
    pub data: Option<DateTime<Utc>>,
    pub metodo_pagamento: MetodoPagamento,
    pub estado: EstadoReceita,
    #[serde(default)]
    pub observacoes: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceitaRequest {
    #[validate(length(min = 1, message = "A descrição da receita é obrigatória."))]
    pub descricao: Option<String>,
    #[validate(range(min = 0.01, message = "O valor deve ser positivo."))]
    pub valor: Option<f64>,
    pub categoria: Option<CategoriaReceita>,
    pub data: Option<DateTime<Utc>>,
    pub metodo_pagamento: Option<MetodoPagamento>,
    pub estado: Option<EstadoReceita>,
    pub observacoes: Option<String>,
}

/// POST /receitas
pub async fn create_receita(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateReceitaRequest>,
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

    let criador_nome = data
        .mongodb
        .users()
        .find_one(doc! { "userId": &current_user })
        .await
        .ok()
        .flatten()
        .map(|user| user.name)
        .unwrap_or_default();

    let new_receita = Receita {
        receita_id: Uuid::new_v4().to_string(),
        descricao: payload.descricao.clone(),
        valor: payload.valor,
        categoria: payload.categoria,
        data: payload.data,
        metodo_pagamento: payload.metodo_pagamento,
        estado: payload.estado,
        observacoes: payload.observacoes.clone(),
        criado_em: Utc::now(),
        atualizado_em: None,
        criado_por: CriadoPor {
            uid: current_user,
            nome: criador_nome,
        },
    };

    match data.mongodb.receitas().insert_one(&new_receita).await {
        Ok(_) => {
            info!("Receita created: {}", new_receita.receita_id);
            HttpResponse::Ok().json(&new_receita)
        }
        Err(e) => {
            error!("Error inserting receita: {}", e);
            HttpResponse::InternalServerError().body("Error inserting receita")
        }
    }
}

/// GET /receitas
pub async fn list_receitas(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.receitas();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching receitas: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching receitas");
        }
    };

    let mut receitas = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(receita) => receitas.push(receita),
            Err(e) => {
                error!("Error reading receitas: {}", e);
                return HttpResponse::InternalServerError().body("Error reading receitas");
            }
        }
    }
    HttpResponse::Ok().json(receitas)
}

/// GET /receitas/search?search=&estado=
/// The category prefix search combined with the status filter.
pub async fn search_receitas(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let live = build_live_query(&params.search, &params.estado, &SEARCH_FIELDS);
    let coll = data.mongodb.receitas();
    let mut find = coll.find(live.filter);
    if let Some(sort) = live.sort {
        find = find.sort(sort);
    }

    let mut cursor = match find.await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error searching receitas: {}", e);
            return HttpResponse::InternalServerError().body("Error searching receitas");
        }
    };

    let mut receitas = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(receita) => receitas.push(receita),
            Err(e) => {
                error!("Error reading receitas: {}", e);
                return HttpResponse::InternalServerError().body("Error reading receitas");
            }
        }
    }
    HttpResponse::Ok().json(receitas)
}

/// GET /receitas/{id}
pub async fn get_receita(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let receita_id = path.into_inner();
    match data
        .mongodb
        .receitas()
        .find_one(doc! { "receitaId": &receita_id })
        .await
    {
        Ok(Some(receita)) => HttpResponse::Ok().json(receita),
        Ok(None) => HttpResponse::NotFound().body("Receita not found"),
        Err(e) => {
            error!("Error fetching receita: {}", e);
            HttpResponse::InternalServerError().body("Error fetching receita")
        }
    }
}

/// PUT /receitas/{id}
pub async fn update_receita(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateReceitaRequest>,
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
    if let Some(descricao) = &payload.descricao {
        set_doc.insert("descricao", descricao);
    }
    if let Some(valor) = &payload.valor {
        set_doc.insert("valor", valor);
    }
    if let Some(categoria) = &payload.categoria {
        set_doc.insert("categoria", categoria.as_str());
    }
    if let Some(data_receita) = &payload.data {
        set_doc.insert("data", date_bson(data_receita));
    }
    if let Some(metodo_pagamento) = &payload.metodo_pagamento {
        set_doc.insert("metodoPagamento", metodo_pagamento.as_str());
    }
    if let Some(estado) = &payload.estado {
        set_doc.insert("estado", estado.as_str());
    }
    if let Some(observacoes) = &payload.observacoes {
        set_doc.insert("observacoes", observacoes);
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }
    set_doc.insert("atualizadoEm", date_bson(&Utc::now()));

    let receita_id = path.into_inner();
    match data
        .mongodb
        .receitas()
        .update_one(doc! { "receitaId": &receita_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("Receita updated"),
        Ok(_) => HttpResponse::NotFound().body("Receita not found"),
        Err(e) => {
            error!("Error updating receita: {}", e);
            HttpResponse::InternalServerError().body("Error updating receita")
        }
    }
}

/// DELETE /receitas/{id}
pub async fn delete_receita(
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

    let receita_id = path.into_inner();
    match data
        .mongodb
        .receitas()
        .delete_one(doc! { "receitaId": &receita_id })
        .await
    {
        Ok(res) if res.deleted_count == 1 => HttpResponse::Ok().body("Receita deleted"),
        Ok(_) => HttpResponse::NotFound().body("Receita not found"),
        Err(e) => {
            error!("Error deleting receita: {}", e);
            HttpResponse::InternalServerError().body("Error deleting receita")
        }
    }
}

/// GET /receitas/export
pub async fn export_receitas(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let coll = data.mongodb.receitas();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "criadoEm": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching receitas: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching receitas");
        }
    };
    let mut receitas = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(receita) => receitas.push(receita),
            Err(e) => {
                error!("Error reading receitas: {}", e);
                return HttpResponse::InternalServerError().body("Error reading receitas");
            }
        }
    }

    let rows = receita_rows(&receitas);
    match render_table_pdf(&RECEITAS_TABLE, &rows, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", RECEITAS_TABLE.file_name),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating receitas PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

/// GET /receitas/{id}/export
pub async fn export_receita_ficha(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let receita_id = path.into_inner();
    let receita = match data
        .mongodb
        .receitas()
        .find_one(doc! { "receitaId": &receita_id })
        .await
    {
        Ok(Some(receita)) => receita,
        Ok(None) => return HttpResponse::NotFound().body("Receita not found"),
        Err(e) => {
            error!("Error fetching receita: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching receita");
        }
    };

    let title = format!("Detalhes da Receita - {}", receita.descricao);
    let fields = receita_detail(&receita);
    match render_record_pdf(&title, &fields, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"Detalhes_da_receita_{}.pdf\"", receita.descricao),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating receita PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}
