use thiserror::Error;

use crate::adapters::sql_warehouse::DatabaseBackend;
use crate::config::{
    CortexSettings, ServerSettings, Settings, SnowflakeSettings, WarehouseSettings,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&settings.server, &mut errors);
        Self::validate_snowflake(&settings.snowflake, &mut errors);
        Self::validate_cortex(&settings.cortex, &mut errors);
        Self::validate_warehouse(&settings.warehouse, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings, errors: &mut Vec<ValidationError>) {
        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }
    }

    fn validate_snowflake(snowflake: &SnowflakeSettings, errors: &mut Vec<ValidationError>) {
        require(&snowflake.account, "snowflake.account", errors);
        require(&snowflake.user, "snowflake.user", errors);

        if snowflake.private_key_path.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField(
                "snowflake.private_key_path".to_string(),
            ));
        }

        if snowflake.token_refresh_margin_seconds >= 3600 {
            errors.push(ValidationError::InvalidValue {
                field: "snowflake.token_refresh_margin_seconds".to_string(),
                reason: "Margin must be shorter than the one hour assertion lifetime".to_string(),
            });
        }
    }

    fn validate_cortex(cortex: &CortexSettings, errors: &mut Vec<ValidationError>) {
        require(&cortex.agent_url, "cortex.agent_url", errors);
        if !cortex.agent_url.is_empty() {
            check_http_url(&cortex.agent_url, "cortex.agent_url", errors);
        }

        require(&cortex.model, "cortex.model", errors);
        require(&cortex.search_service, "cortex.search_service", errors);
        require(&cortex.search_tool_name, "cortex.search_tool_name", errors);
        require(&cortex.analyst_tool_name, "cortex.analyst_tool_name", errors);

        if cortex.search_tool_name == cortex.analyst_tool_name {
            errors.push(ValidationError::InvalidValue {
                field: "cortex.analyst_tool_name".to_string(),
                reason: "Tool names must be distinct".to_string(),
            });
        }

        match (&cortex.semantic_model_file, &cortex.semantic_view) {
            (Some(_), Some(_)) => errors.push(ValidationError::InvalidValue {
                field: "cortex.semantic_model_file".to_string(),
                reason: "Set either semantic_model_file or semantic_view, not both".to_string(),
            }),
            (None, None) => errors.push(ValidationError::MissingField(
                "cortex.semantic_model_file or cortex.semantic_view".to_string(),
            )),
            _ => {}
        }

        if cortex.search_max_results == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "cortex.search_max_results".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
    }

    fn validate_warehouse(warehouse: &WarehouseSettings, errors: &mut Vec<ValidationError>) {
        match warehouse {
            WarehouseSettings::Sql(sql) => {
                if let Err(e) = DatabaseBackend::from_url(&sql.url) {
                    errors.push(ValidationError::InvalidValue {
                        field: "warehouse.url".to_string(),
                        reason: e.to_string(),
                    });
                }
                if sql.max_connections == 0 {
                    errors.push(ValidationError::InvalidValue {
                        field: "warehouse.max_connections".to_string(),
                        reason: "Must be at least 1".to_string(),
                    });
                }
            }
            WarehouseSettings::SnowflakeSqlApi(api) => {
                require(&api.base_url, "warehouse.base_url", errors);
                if !api.base_url.is_empty() {
                    check_http_url(&api.base_url, "warehouse.base_url", errors);
                }
                if api.max_poll_attempts == 0 {
                    errors.push(ValidationError::InvalidValue {
                        field: "warehouse.max_poll_attempts".to_string(),
                        reason: "Must be at least 1".to_string(),
                    });
                }
            }
        }
    }
}

fn require(value: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(ValidationError::MissingField(field.to_string()));
    }
}

fn check_http_url(value: &str, field: &str, errors: &mut Vec<ValidationError>) {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("Unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}
