use std::error::Error;

use stock_dashboard::{
    routes::{init_tracing, make_app},
    utils::config::Config,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::init();
    let app = make_app(&config).await?;

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
