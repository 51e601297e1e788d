//! trust-webhook - defaulting webhook for trust.cert-manager.io Bundles

use clap::Parser;
use kube::CustomResourceExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use trust_webhook::apis::v1alpha1::Bundle;
use trust_webhook::config::{Config, LogFormat};
use trust_webhook::password_hash::PasswordHasher;
use trust_webhook::{BundleDefaulter, DefaultingHandler, WebhookServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    if config.crd {
        let crd = serde_yaml::to_string(&Bundle::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    init_tracing(config.log_format);

    let defaulter = BundleDefaulter::new(
        tracing::info_span!("defaulter", kind = "Bundle"),
        PasswordHasher::new(config.password_hash_polynomial),
    );
    tracing::info!(
        polynomial = ?config.password_hash_polynomial,
        "deriving password hashes"
    );

    WebhookServer::builder()
        .mutator(DefaultingHandler::new("bundle-defaulter", defaulter))
        .run(&config.server)
        .await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}
