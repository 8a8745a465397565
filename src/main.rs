use clap::Parser;
use cortex_gateway::adapters::cortex_client::CortexAgentClient;
use cortex_gateway::adapters::credential_cache::CredentialCache;
use cortex_gateway::adapters::credential_signer::KeyPairSigner;
use cortex_gateway::adapters::snowflake_sql_api::SnowflakeSqlApiWarehouse;
use cortex_gateway::adapters::sql_warehouse::SqlWarehouse;
use cortex_gateway::application::AgentPipeline;
use cortex_gateway::cli::Cli;
use cortex_gateway::config::{Settings, WarehouseSettings};
use cortex_gateway::domain::WarehousePort;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Load configuration (CLI > env vars > config file)
    let settings = Settings::new_with_cli(&cli)?;

    let signer = Arc::new(KeyPairSigner::from_settings(&settings.snowflake));
    info!(
        "Signing assertions for {}.{}",
        signer.account(),
        signer.user()
    );

    let credentials = Arc::new(CredentialCache::new(
        signer,
        chrono::Duration::seconds(settings.snowflake.token_refresh_margin_seconds as i64),
    ));

    let agent = Arc::new(CortexAgentClient::new(&settings.cortex, credentials.clone()));

    let warehouse: Arc<dyn WarehousePort> = match &settings.warehouse {
        WarehouseSettings::Sql(sql) => Arc::new(SqlWarehouse::from_settings(sql).await?),
        WarehouseSettings::SnowflakeSqlApi(api) => {
            info!("Executing queries through the SQL API at {}", api.base_url);
            Arc::new(SnowflakeSqlApiWarehouse::new(api, credentials.clone()))
        }
    };

    let pipeline = Arc::new(AgentPipeline::new(agent, warehouse));

    if let Some(prompt) = &cli.prompt {
        let response = pipeline.handle_prompt(prompt).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let app = cortex_gateway::create_app(pipeline);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!("Cortex gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
