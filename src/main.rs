use dotenvy::dotenv;
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

use order_service::{
    config::Config,
    repositories::{sql::SqlOrderRepository, OrderRepository},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let orders = SqlOrderRepository::connect(&config).await?;
    orders.init_schema().await?;

    let stored = orders.count().await?;
    tracing::info!(orders = stored, "order store ready");

    orders.pool().close().await;
    Ok(())
}
