pub mod api_handler;
pub mod cortex_client;
pub mod credential_cache;
pub mod credential_signer;
pub mod health_handler;
pub mod snowflake_sql_api;
pub mod sql_warehouse;
pub mod stream_parser;
