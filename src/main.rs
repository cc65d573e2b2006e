// src/main.rs

mod app_state;
mod auth;
mod colaborador;
mod config;
mod dashboard;
mod db;
mod despesa;
mod export;
mod format;
mod models;
mod projecto;
mod query;
mod receita;
mod roles;
mod user_management;
mod validation;

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures::future::{ok, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::app_state::AppState;
use crate::auth::{login, Claims};
use crate::colaborador::{
    create_colaborador, delete_colaborador, export_colaborador_ficha, export_colaboradores,
    get_colaborador, list_colaboradores, search_colaboradores, update_colaborador,
};
use crate::dashboard::get_dashboard;
use crate::despesa::{
    create_despesa, delete_despesa, export_despesa_ficha, export_despesas, get_despesa,
    list_despesas, search_despesas, update_despesa,
};
use crate::projecto::{
    create_projecto, delete_projecto, export_projecto_ficha, export_projectos, get_projecto,
    list_projectos, search_projectos, update_projecto,
};
use crate::receita::{
    create_receita, delete_receita, export_receita_ficha, export_receitas, get_receita,
    list_receitas, search_receitas, update_receita,
};
use crate::user_management::{
    create_user, delete_user, export_user_ficha, export_users, get_user, get_user_role,
    list_users, search_users, update_user,
};

#[derive(Debug)]
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware { service })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        // Extract "Bearer <token>" from the Authorization header if present
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if auth_str.starts_with("Bearer ") {
                    let token = auth_str.trim_start_matches("Bearer ").trim().to_string();
                    match verify_token(&token) {
                        Ok(user_id) => {
                            // Insert user_id as a string extension
                            req.extensions_mut().insert(user_id);
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .body(format!("Invalid token: {}", e))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

fn verify_token(token: &str) -> Result<String, String> {
    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string());
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    ) {
        Ok(token_data) => Ok(token_data.claims.sub),
        Err(e) => Err(format!("Token decode error: {}", e)),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);

    println!("Server running at http://0.0.0.0:8080");
    println!("Allowed CORS Origin: {}", config.frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication)
            .app_data(web::Data::new(AppState {
                mongodb: mongodb.clone(),
                config: config.clone(),
            }))
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(login))
            )
            // COLABORADORES
            .service(
                web::scope("/colaboradores")
                    .route("", web::get().to(list_colaboradores))
                    .route("", web::post().to(create_colaborador))
                    .route("/search", web::get().to(search_colaboradores))
                    .route("/export", web::get().to(export_colaboradores))
                    .route("/{id}", web::get().to(get_colaborador))
                    .route("/{id}", web::put().to(update_colaborador))
                    .route("/{id}", web::delete().to(delete_colaborador))
                    .route("/{id}/export", web::get().to(export_colaborador_ficha))
            )
            // PROJECTOS
            .service(
                web::scope("/projectos")
                    .route("", web::get().to(list_projectos))
                    .route("", web::post().to(create_projecto))
                    .route("/search", web::get().to(search_projectos))
                    .route("/export", web::get().to(export_projectos))
                    .route("/{id}", web::get().to(get_projecto))
                    .route("/{id}", web::put().to(update_projecto))
                    .route("/{id}", web::delete().to(delete_projecto))
                    .route("/{id}/export", web::get().to(export_projecto_ficha))
            )
            // DESPESAS
            .service(
                web::scope("/despesas")
                    .route("", web::get().to(list_despesas))
                    .route("", web::post().to(create_despesa))
                    .route("/search", web::get().to(search_despesas))
                    .route("/export", web::get().to(export_despesas))
                    .route("/{id}", web::get().to(get_despesa))
                    .route("/{id}", web::put().to(update_despesa))
                    .route("/{id}", web::delete().to(delete_despesa))
                    .route("/{id}/export", web::get().to(export_despesa_ficha))
            )
            // RECEITAS
            .service(
                web::scope("/receitas")
                    .route("", web::get().to(list_receitas))
                    .route("", web::post().to(create_receita))
                    .route("/search", web::get().to(search_receitas))
                    .route("/export", web::get().to(export_receitas))
                    .route("/{id}", web::get().to(get_receita))
                    .route("/{id}", web::put().to(update_receita))
                    .route("/{id}", web::delete().to(delete_receita))
                    .route("/{id}/export", web::get().to(export_receita_ficha))
            )
            // USERS
            .service(
                web::scope("/users")
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user))
                    .route("/search", web::get().to(search_users))
                    .route("/export", web::get().to(export_users))
                    .route("/role/{id}", web::get().to(get_user_role))
                    .route("/{id}", web::get().to(get_user))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::delete().to(delete_user))
                    .route("/{id}/export", web::get().to(export_user_ficha))
            )
            // DASHBOARD
            .route("/dashboard", web::get().to(get_dashboard))
    })
        .bind("0.0.0.0:8080")?
        .run()
        .await
}
