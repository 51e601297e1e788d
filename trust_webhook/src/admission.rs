use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tracing::{error, info};

use crate::defaulter::CustomDefaulter;
use crate::{Error, HandlerError};

#[async_trait]
pub trait MutatingAdmissionHandler: Send + Sync {
    /// Error type returned by the handler
    type Err: StdError + Send + Sync + 'static;

    /// Returns the name of this handler for logging purposes
    fn name(&self) -> &'static str;

    /// Mutates the resource in the admission request
    ///
    /// Returns an `AdmissionResponse` that may include JSON patches to modify the resource.
    /// If no patches are needed, return `AdmissionResponse::from(req)`.
    async fn mutate(
        &self,
        req: &AdmissionRequest<DynamicObject>,
    ) -> Result<AdmissionResponse, Self::Err>;
}

/// Serves a [`CustomDefaulter`] as a mutating admission handler
///
/// The object in the request is defaulted and the difference is returned as
/// a JSON patch. Requests without an object, such as deletes, pass through.
pub struct DefaultingHandler<D> {
    name: &'static str,
    defaulter: D,
}

impl<D> DefaultingHandler<D>
where
    D: CustomDefaulter,
{
    pub const fn new(name: &'static str, defaulter: D) -> Self {
        Self { name, defaulter }
    }
}

#[async_trait]
impl<D> MutatingAdmissionHandler for DefaultingHandler<D>
where
    D: CustomDefaulter + 'static,
{
    type Err = HandlerError;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn mutate(
        &self,
        req: &AdmissionRequest<DynamicObject>,
    ) -> Result<AdmissionResponse, Self::Err> {
        let res = AdmissionResponse::from(req);

        let Some(obj) = req.object.as_ref() else {
            return Ok(res);
        };

        let mut obj = obj.clone();
        let patch = self.defaulter.default_object(&mut obj)?;
        if patch.0.is_empty() {
            return Ok(res);
        }

        res.with_patch(patch)
            .map_err(|e| HandlerError::from(Error::PatchError(e.to_string())))
    }
}

/// Creates a warp route handler for mutating admission webhooks
pub(crate) fn create_mutating_route<E: StdError + Send + Sync + 'static>(
    handlers: Vec<Box<dyn MutatingAdmissionHandler<Err = E>>>,
) -> impl Fn(
    AdmissionReview<DynamicObject>,
) -> std::pin::Pin<Box<dyn Future<Output = Result<warp::reply::Json, Infallible>> + Send>>
+ Clone {
    let handlers = Arc::new(handlers);
    move |body: AdmissionReview<DynamicObject>| {
        let handlers = handlers.clone();
        Box::pin(async move {
            let req: AdmissionRequest<_> = match body.try_into() {
                Ok(req) => req,
                Err(err) => {
                    error!("invalid admission request: {}", err);
                    return Ok(warp::reply::json(
                        &AdmissionResponse::invalid(err.to_string()).into_review(),
                    ));
                }
            };

            Ok(warp::reply::json(&review(&handlers, &req).await.into_review()))
        })
    }
}

/// Runs every handler against `req`, stopping at the first denial
async fn review<E: StdError + Send + Sync + 'static>(
    handlers: &[Box<dyn MutatingAdmissionHandler<Err = E>>],
    req: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let mut res = AdmissionResponse::from(req);

    let Some(obj) = &req.object else {
        return res;
    };

    let name = obj.name_any();
    let kind = obj.types.clone().unwrap_or_default().kind;

    for handler in handlers {
        match handler.mutate(req).await {
            Ok(handler_res) => {
                res = merge_responses(res, handler_res);
                if !res.allowed {
                    break;
                }
                info!(
                    handler = handler.name(),
                    operation = ?req.operation,
                    kind = %kind,
                    name = %name,
                    "mutated resource"
                );
            }
            Err(err) => {
                error!(
                    handler = handler.name(),
                    operation = ?req.operation,
                    kind = %kind,
                    name = %name,
                    error = %err,
                    "mutation failed"
                );
                res = res.deny(format!("{}: {}", handler.name(), err));
                break;
            }
        }
    }

    res
}

fn merge_responses(base: AdmissionResponse, other: AdmissionResponse) -> AdmissionResponse {
    use json_patch::Patch;
    use serde_json::*;

    if !other.allowed {
        return other;
    }

    let Some(base_patch) = base.patch.as_ref() else {
        return other;
    };
    let Some(other_patch) = other.patch.as_ref() else {
        return base;
    };

    let (Ok(base_patches), Ok(other_patches)) = (
        from_slice::<Vec<Value>>(base_patch),
        from_slice::<Vec<Value>>(other_patch),
    ) else {
        return base;
    };

    let combined = [base_patches, other_patches]
        .into_iter()
        .flatten()
        .collect::<Value>();

    let Ok(patch) = from_value::<Patch>(combined) else {
        return base;
    };

    other.with_patch(patch).unwrap_or(base)
}
