// src/user_management.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::export::{render_record_pdf, render_table_pdf, user_detail, user_rows, USERS_TABLE};
use crate::models::user::{User, UserInfo};
use crate::query::{build_live_query, SearchFields};
use crate::roles::{allowed_actions, fetch_role, Role};
use crate::validation::validation_error_response;

const SEARCH_FIELDS: SearchFields = SearchFields {
    search: "name",
    estado: "role",
    criado_em: "createdAt",
};

/// Account creation payload. The password only ever exists here in memory;
/// the stored document carries the bcrypt hash.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 100, message = "O nome deve conter no minímo 2 caracteres!"))]
    pub name: String,
    #[validate(email(message = "Insira um e-mail válido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A password deve ter pelo menos 6 caracteres."))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100, message = "O nome deve conter no minímo 2 caracteres!"))]
    pub name: Option<String>,
    #[validate(email(message = "Insira um e-mail válido."))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "A password deve ter pelo menos 6 caracteres."))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UserSearchParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub role: String,
}

/// POST /users
/// Creates the credential and the role document in one step.
pub async fn create_user(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateUserRequest>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }
    if let Err(errors) = payload.validate() {
        return validation_error_response(errors);
    }

    let password_hash = match hash(&payload.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(_) => return HttpResponse::InternalServerError().body("Error hashing password"),
    };

    let new_user = User {
        user_id: Uuid::new_v4().to_string(),
        name: payload.name.clone(),
        email: payload.email.clone(),
        role: payload.role.as_str().to_string(),
        password_hash,
        created_at: Utc::now(),
    };

    match data.mongodb.users().insert_one(&new_user).await {
        Ok(_) => {
            info!("User created: {}", new_user.user_id);
            HttpResponse::Ok().json(UserInfo::from(&new_user))
        }
        Err(e) => {
            error!("Error inserting user: {}", e);
            HttpResponse::InternalServerError().body("Error inserting user")
        }
    }
}

/// GET /users
pub async fn list_users(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let coll = data.mongodb.users();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "createdAt": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching users: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching users");
        }
    };

    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(UserInfo::from(&user)),
            Err(e) => {
                error!("Error reading users: {}", e);
                return HttpResponse::InternalServerError().body("Error reading users");
            }
        }
    }
    HttpResponse::Ok().json(users)
}

/// GET /users/search?search=&role=
pub async fn search_users(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<UserSearchParams>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let live = build_live_query(&params.search, &params.role, &SEARCH_FIELDS);
    let coll = data.mongodb.users();
    let mut find = coll.find(live.filter);
    if let Some(sort) = live.sort {
        find = find.sort(sort);
    }

    let mut cursor = match find.await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error searching users: {}", e);
            return HttpResponse::InternalServerError().body("Error searching users");
        }
    };

    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(UserInfo::from(&user)),
            Err(e) => {
                error!("Error reading users: {}", e);
                return HttpResponse::InternalServerError().body("Error reading users");
            }
        }
    }
    HttpResponse::Ok().json(users)
}

/// GET /users/role/{id}
/// The role lookup the frontend runs once per session to decide which
/// actions to render. Users may only ask about themselves.
pub async fn get_user_role(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let user_id = path.into_inner();
    if current_user != user_id {
        return HttpResponse::Unauthorized().body("Cannot access other user's role");
    }

    let role = fetch_role(&data.mongodb.db, &user_id).await;
    HttpResponse::Ok().json(serde_json::json!({
        "role": role.map(|r| r.as_str()),
        "actions": allowed_actions(role),
    }))
}

/// GET /users/{id}
pub async fn get_user(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let user_id = path.into_inner();
    match data.mongodb.users().find_one(doc! { "userId": &user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(UserInfo::from(&user)),
        Ok(None) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error fetching user: {}", e);
            HttpResponse::InternalServerError().body("Error fetching user")
        }
    }
}

/// PUT /users/{id}
pub async fn update_user(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }
    if let Err(errors) = payload.validate() {
        return validation_error_response(errors);
    }

    let mut set_doc = doc! {};
    if let Some(name) = &payload.name {
        set_doc.insert("name", name);
    }
    if let Some(email) = &payload.email {
        set_doc.insert("email", email);
    }
    if let Some(new_role) = &payload.role {
        set_doc.insert("role", new_role.as_str());
    }
    if let Some(password) = &payload.password {
        match hash(password, DEFAULT_COST) {
            Ok(h) => {
                set_doc.insert("passwordHash", h);
            }
            Err(_) => return HttpResponse::InternalServerError().body("Error hashing password"),
        }
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }

    let user_id = path.into_inner();
    match data
        .mongodb
        .users()
        .update_one(doc! { "userId": &user_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("User updated"),
        Ok(_) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error updating user: {}", e);
            HttpResponse::InternalServerError().body("Error updating user")
        }
    }
}

/// DELETE /users/{id}
pub async fn delete_user(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let user_id = path.into_inner();
    match data.mongodb.users().delete_one(doc! { "userId": &user_id }).await {
        Ok(res) if res.deleted_count == 1 => HttpResponse::Ok().body("User deleted"),
        Ok(_) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error deleting user: {}", e);
            HttpResponse::InternalServerError().body("Error deleting user")
        }
    }
}

/// GET /users/export
pub async fn export_users(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let coll = data.mongodb.users();
    let mut cursor = match coll.find(doc! {}).sort(doc! { "createdAt": 1 }).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching users: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching users");
        }
    };
    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(user),
            Err(e) => {
                error!("Error reading users: {}", e);
                return HttpResponse::InternalServerError().body("Error reading users");
            }
        }
    }

    let rows = user_rows(&users);
    match render_table_pdf(&USERS_TABLE, &rows, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", USERS_TABLE.file_name),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating users PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}

/// GET /users/{id}/export
pub async fn export_user_ficha(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let current_user = match req.extensions().get::<String>() {
        Some(uid) => uid.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };
    let role = fetch_role(&data.mongodb.db, &current_user).await;
    if !role.map_or(false, Role::can_manage_users) {
        return HttpResponse::Forbidden().body("Insufficient permissions");
    }

    let user_id = path.into_inner();
    let user = match data.mongodb.users().find_one(doc! { "userId": &user_id }).await {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error fetching user: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching user");
        }
    };

    let title = format!("Ficha do Usuário - {}", user.name);
    let fields = user_detail(&user);
    match render_record_pdf(&title, &fields, Utc::now()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}_ficha.pdf\"", user.name),
            ))
            .body(bytes),
        Err(e) => {
            error!("Error generating user PDF: {}", e);
            HttpResponse::InternalServerError().body("Error generating PDF")
        }
    }
}
