// src/dashboard.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use log::error;
use mongodb::bson::doc;

use crate::app_state::AppState;

/// GET /dashboard
/// The landing page summary cards: collection totals plus the settled
/// financial sums.
pub async fn get_dashboard(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if req.extensions().get::<String>().is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let total_colaboradores = match data.mongodb.colaboradores().count_documents(doc! {}).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting colaboradores: {}", e);
            return HttpResponse::InternalServerError().body("Error loading dashboard");
        }
    };
    let total_projectos = match data.mongodb.projectos().count_documents(doc! {}).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting projectos: {}", e);
            return HttpResponse::InternalServerError().body("Error loading dashboard");
        }
    };
    let total_usuarios = match data.mongodb.users().count_documents(doc! {}).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting users: {}", e);
            return HttpResponse::InternalServerError().body("Error loading dashboard");
        }
    };

    let mut despesas_pagas = 0.0_f64;
    let mut cursor = match data.mongodb.despesas().find(doc! { "estado": "Pago" }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching despesas: {}", e);
            return HttpResponse::InternalServerError().body("Error loading dashboard");
        }
    };
    while let Some(result) = cursor.next().await {
        match result {
            Ok(despesa) => despesas_pagas += despesa.valor,
            Err(e) => {
                error!("Error reading despesas: {}", e);
                return HttpResponse::InternalServerError().body("Error loading dashboard");
            }
        }
    }

    let mut receitas_recebidas = 0.0_f64;
    let mut cursor = match data.mongodb.receitas().find(doc! { "estado": "Recebida" }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching receitas: {}", e);
            return HttpResponse::InternalServerError().body("Error loading dashboard");
        }
    };
    while let Some(result) = cursor.next().await {
        match result {
            Ok(receita) => receitas_recebidas += receita.valor,
            Err(e) => {
                error!("Error reading receitas: {}", e);
                return HttpResponse::InternalServerError().body("Error loading dashboard");
            }
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "totalColaboradores": total_colaboradores,
        "totalProjectos": total_projectos,
        "totalUsuarios": total_usuarios,
        "despesasPagas": despesas_pagas,
        "receitasRecebidas": receitas_recebidas,
    }))
}
