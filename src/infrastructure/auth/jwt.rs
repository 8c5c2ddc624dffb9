use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::config::JwtConfig;
use crate::error::AppError;

use super::Claims;

pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::default();

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_config() -> JwtConfig {
        JwtConfig {
            secret: "atlas-test-secret".to_string(),
            issuer: None,
            audience: None,
        }
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn operator_claims(exp_offset: i64) -> Claims {
        Claims {
            sub: "operator-7".to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iat: chrono::Utc::now().timestamp(),
            roles: vec!["catalog_maintainer".to_string()],
            tenant_id: Some("springfield".to_string()),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_valid_token() {
        let config = create_test_config();
        let validator = JwtValidator::new(&config);

        let token = create_test_token(&operator_claims(3600), &config.secret);
        let claims = validator.validate(&token).unwrap();

        assert_eq!(claims.operator_id(), "operator-7");
        assert_eq!(claims.tenant_id.as_deref(), Some("springfield"));
        assert!(claims.is_catalog_maintainer());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = create_test_config();
        let validator = JwtValidator::new(&config);

        let token = create_test_token(&operator_claims(-3600), &config.secret);
        assert!(matches!(validator.validate(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = JwtValidator::new(&create_test_config());

        let token = create_test_token(&operator_claims(3600), "some-other-secret");
        assert!(validator.validate(&token).is_err());
    }
}
