use std::env;

use anyhow::Result;

use crate::services::emissions::EmissionFactors;

/// Deployment-level Odoo service account used only by the fixed
/// emissions-summary endpoint. Per-user flows carry credentials in the
/// request body and never touch this.
#[derive(Debug, Clone)]
pub struct ServiceAccountConfig {
    pub instance_url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ServiceAccountConfig {
    fn from_env() -> Option<Self> {
        let instance_url = env::var("ODOO_SERVICE_URL").ok()?;
        let database = env::var("ODOO_SERVICE_DB").ok()?;
        let username = env::var("ODOO_SERVICE_USER").ok()?;
        // Odoo API keys are passed in the password slot of the login RPC.
        let password = env::var("ODOO_SERVICE_API_KEY")
            .or_else(|_| env::var("ODOO_SERVICE_PASSWORD"))
            .ok()?;
        Some(Self {
            instance_url,
            database,
            username,
            password,
        })
    }
}

/// Static labels reported alongside the emissions summary.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub company: String,
    pub plant: String,
    pub location: String,
}

/// Assumed freight movement feeding the transport emission line.
///
/// Placeholder until a real logistics data source exists: the upstream ERP
/// exposes no tonne-km figures, so the summary endpoint applies these fixed
/// values instead of deriving them from order data.
#[derive(Debug, Clone)]
pub struct TransportAssumption {
    pub tonnes: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub service_account: Option<ServiceAccountConfig>,
    pub site: SiteProfile,
    pub transport_assumption: TransportAssumption,
    pub emission_factors: EmissionFactors,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let site = SiteProfile {
            company: env::var("SITE_COMPANY").unwrap_or_else(|_| "UltraTech Cement Ltd".to_string()),
            plant: env::var("SITE_PLANT").unwrap_or_else(|_| "CMT-01".to_string()),
            location: env::var("SITE_LOCATION")
                .unwrap_or_else(|_| "Satara, Maharashtra".to_string()),
        };

        let transport_assumption = TransportAssumption {
            tonnes: env_f64("TRANSPORT_ASSUMED_TONNES", 1950.0),
            distance_km: env_f64("TRANSPORT_ASSUMED_DISTANCE_KM", 250.0),
        };

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            cors_origins,
            service_account: ServiceAccountConfig::from_env(),
            site,
            transport_assumption,
            emission_factors: EmissionFactors::from_env(),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_f64_falls_back_on_garbage() {
        std::env::set_var("TEST_ENV_F64_GARBAGE", "not-a-number");
        assert_eq!(env_f64("TEST_ENV_F64_GARBAGE", 7.5), 7.5);
        std::env::remove_var("TEST_ENV_F64_GARBAGE");
    }

    #[test]
    fn env_f64_reads_valid_values() {
        std::env::set_var("TEST_ENV_F64_VALID", "123.25");
        assert_eq!(env_f64("TEST_ENV_F64_VALID", 0.0), 123.25);
        std::env::remove_var("TEST_ENV_F64_VALID");
    }
}
