use actix_web::{web, HttpResponse, Responder};
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::error;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Deserialize)]
pub struct LoginInfo {
    pub email: String,
    pub password: String,
}

// JWT Creation
pub fn create_jwt(user_id: &str, secret: &str) -> String {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
}

// JWT Validation
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// POST /auth/login
/// Email + password against the stored bcrypt hash; answers with the token
/// and the role string the frontend gates its navigation on.
pub async fn login(
    data: web::Data<AppState>,
    login_info: web::Json<LoginInfo>,
) -> impl Responder {
    let users_collection = data.mongodb.users();
    let user_doc = users_collection
        .find_one(doc! { "email": &login_info.email })
        .await;

    match user_doc {
        Ok(Some(user)) => {
            if verify(&login_info.password, &user.password_hash).unwrap_or(false) {
                let token = create_jwt(&user.user_id, &data.config.jwt_secret);
                HttpResponse::Ok().json(serde_json::json!({
                    "token": token,
                    "userId": user.user_id,
                    "name": user.name,
                    "role": user.role,
                }))
            } else {
                HttpResponse::Unauthorized().body("Invalid credentials")
            }
        }
        Ok(None) => HttpResponse::Unauthorized().body("User not found"),
        Err(e) => {
            error!("Error logging in: {}", e);
            HttpResponse::InternalServerError().body("Error logging in")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_round_trips_the_user_id() {
        let token = create_jwt("user-42", "test-secret");
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "user-42");
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn jwt_rejects_a_wrong_secret() {
        let token = create_jwt("user-42", "test-secret");
        assert!(validate_jwt(&token, "another-secret").is_err());
    }
}
