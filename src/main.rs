mod telemetry;

use nudge_api::Application;
use nudge_infra::{setup_context, NudgeContext};
use telemetry::{get_subscriber, init_subscriber};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("nudge".into(), "info".into());
    init_subscriber(subscriber);

    let context = if std::env::args().any(|arg| arg == "inmemory") {
        info!("Starting with inmemory repositories");
        NudgeContext::create_inmemory()
    } else {
        setup_context()
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?
    };

    let app = Application::new(context).await?;
    app.start().await
}
