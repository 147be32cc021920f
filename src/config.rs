use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Rules applied to account registration and password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPolicy {
    pub email_domain: String,
    pub min_password_len: usize,
    pub code_ttl_minutes: i64,
}

/// Outbound email provider. `api_url == None` means codes are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub accounts: AccountPolicy,
    pub mail: MailConfig,
    pub manager_emails: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "campuswall".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "campuswall-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60 * 24),
        };
        let accounts = AccountPolicy {
            email_domain: std::env::var("ALLOWED_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "illinois.edu".into()),
            min_password_len: env_parse("MIN_PASSWORD_LEN", 6),
            code_ttl_minutes: env_parse("VERIFICATION_CODE_TTL_MINUTES", 10),
        };
        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            api_key: std::env::var("MAIL_API_KEY").ok().filter(|v| !v.is_empty()),
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@campuswall.local".into()),
        };
        let manager_emails = parse_email_list(&std::env::var("MANAGER_EMAILS").unwrap_or_default());

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt,
            accounts,
            mail,
            manager_emails,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated list, normalising each address the same way
/// login and registration do.
pub(crate) fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_email_list_trims_and_lowercases() {
        let list = parse_email_list(" Admin@Illinois.edu, ,mod@illinois.edu ,");
        assert_eq!(list, vec!["admin@illinois.edu", "mod@illinois.edu"]);
    }

    #[test]
    fn parse_email_list_empty() {
        assert!(parse_email_list("").is_empty());
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("CAMPUSWALL_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse::<i64>("CAMPUSWALL_TEST_GARBAGE", 42), 42);
        assert_eq!(env_parse::<i64>("CAMPUSWALL_TEST_MISSING", 7), 7);
    }
}
