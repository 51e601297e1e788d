use std::error::Error as StdError;

use tracing::{error, info};
use warp::{Filter, Rejection, Reply};

use crate::admission::{MutatingAdmissionHandler, create_mutating_route};
use crate::config::ServerConfig;
use crate::{Error, Result};

/// Path the API server calls for `Bundle` defaulting
pub const BUNDLE_MUTATE_PATH: &str = "mutate-trust-cert-manager-io-v1alpha1-bundle";

/// Admission webhook server running a chain of mutating handlers
///
/// Every registered mutator sees each review in registration order; the
/// patches they return are concatenated.
pub struct WebhookServer<E> {
    mutators: Vec<Box<dyn MutatingAdmissionHandler<Err = E>>>,
}

impl<E> WebhookServer<E>
where
    E: StdError + Send + Sync + 'static,
{
    /// Registers another mutating handler
    #[must_use]
    pub fn mutator<H>(mut self, handler: H) -> Self
    where
        H: MutatingAdmissionHandler<Err = E> + 'static,
    {
        self.mutators.push(Box::new(handler));
        self
    }

    /// Builds the warp filter serving the webhook and health endpoints
    pub fn routes(self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let mutate = warp::path(BUNDLE_MUTATE_PATH)
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and_then(create_mutating_route(self.mutators));

        let healthz = warp::path("healthz")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| "ok");

        let readyz = warp::path("readyz")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| "ok");

        mutate
            .or(healthz)
            .or(readyz)
            .with(warp::trace::request())
    }

    /// Serves the webhook until ctrl-c is received
    pub async fn run(self, config: &ServerConfig) -> Result<()> {
        let addr = config.socket_addr();
        info!(
            "starting trust webhook with {} mutators",
            self.mutators.len()
        );

        let routes = self.routes();

        match config.tls_paths()? {
            Some((cert_path, key_path)) => {
                let cert = tokio::fs::read(cert_path).await.map_err(|err| {
                    Error::TlsError(format!("reading {}: {err}", cert_path.display()))
                })?;
                let key = tokio::fs::read(key_path).await.map_err(|err| {
                    Error::TlsError(format!("reading {}: {err}", key_path.display()))
                })?;

                let (addr, server) = warp::serve(routes)
                    .tls()
                    .cert(cert)
                    .key(key)
                    .try_bind_with_graceful_shutdown(addr, shutdown_signal())
                    .map_err(|err| Error::TlsError(format!("binding {addr}: {err}")))?;
                info!(%addr, "serving over https");
                server.await;
            }
            None => {
                let (addr, server) = warp::serve(routes)
                    .try_bind_with_graceful_shutdown(addr, shutdown_signal())
                    .map_err(|err| Error::ServerError(std::io::Error::other(err)))?;
                info!(%addr, "serving over plain http");
                server.await;
            }
        }

        info!("trust webhook stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!({ err = &err as &dyn StdError }, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[doc(hidden)]
pub struct WebhookServerBuilder;

impl WebhookServer<()> {
    /// Start building a WebhookServer
    #[must_use]
    pub const fn builder() -> WebhookServerBuilder {
        WebhookServerBuilder
    }
}

impl WebhookServerBuilder {
    /// Registers the first mutating handler, fixing the handler error type
    #[must_use]
    pub fn mutator<H, E>(self, handler: H) -> WebhookServer<E>
    where
        H: MutatingAdmissionHandler<Err = E> + 'static,
        E: StdError + Send + Sync + 'static,
    {
        WebhookServer {
            mutators: vec![Box::new(handler)],
        }
    }
}
