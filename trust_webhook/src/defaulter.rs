//! Defaulting of `Bundle` resources
//!
//! [`CustomDefaulter`] is the typed seam: implementations receive exclusive
//! access to a decoded resource and fill in unset fields. The erased entry
//! point [`CustomDefaulter::default_object`] is what the admission layer
//! calls with whatever object the API server sent.

use json_patch::Patch;
use kube::Resource;
use kube::api::DynamicObject;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Span, info};

use crate::apis::v1alpha1::Bundle;
use crate::password_hash::PasswordHasher;
use crate::{Error, Result};

/// Fills in unset fields of a single resource kind
pub trait CustomDefaulter: Send + Sync {
    /// Resource kind this defaulter accepts
    type Resource: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Send;

    /// Applies defaults in place
    ///
    /// Must be idempotent and additive: values that are already set are
    /// never changed.
    fn apply_defaults(&self, resource: &mut Self::Resource);

    /// Applies defaults to an erased admission object
    ///
    /// Fails with [`Error::UnexpectedType`] before touching `obj` if it is not
    /// a `Self::Resource`. On success `obj` carries the defaulted values and
    /// the returned patch describes the change, empty when nothing changed.
    fn default_object(&self, obj: &mut DynamicObject) -> Result<Patch> {
        let original = parse_object::<Self::Resource>(obj)?;
        let mut defaulted = original.clone();
        self.apply_defaults(&mut defaulted);

        let patch = json_patch::diff(&to_value(&original)?, &to_value(&defaulted)?);
        if patch.0.is_empty() {
            return Ok(patch);
        }

        let mut value = to_value(&*obj)?;
        json_patch::patch(&mut value, &patch.0).map_err(|e| Error::PatchError(e.to_string()))?;
        *obj = serde_json::from_value(value).map_err(Error::SerializationError)?;

        Ok(patch)
    }
}

/// Decodes `obj` as `K` after checking its `apiVersion` and `kind`
pub fn parse_object<K>(obj: &DynamicObject) -> Result<K>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    let expected = K::kind(&());

    let Some(types) = obj.types.as_ref() else {
        return Err(Error::UnexpectedType {
            expected: expected.into_owned(),
            got: "object without apiVersion and kind".to_owned(),
        });
    };

    if types.kind != expected || types.api_version != K::api_version(&()) {
        return Err(Error::UnexpectedType {
            expected: expected.into_owned(),
            got: format!("{}/{}", types.api_version, types.kind),
        });
    }

    serde_json::from_value(to_value(obj)?).map_err(Error::SerializationError)
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(Error::SerializationError)
}

/// Derives the password hashes of a `Bundle`'s additional formats
#[derive(Clone, Debug)]
pub struct BundleDefaulter {
    span: Span,
    hasher: PasswordHasher,
}

impl BundleDefaulter {
    /// Creates a defaulter logging within `span`
    pub fn new(span: Span, hasher: PasswordHasher) -> Self {
        Self { span, hasher }
    }
}

impl Default for BundleDefaulter {
    fn default() -> Self {
        Self::new(
            tracing::info_span!("defaulter", kind = "Bundle"),
            PasswordHasher::default(),
        )
    }
}

impl CustomDefaulter for BundleDefaulter {
    type Resource = Bundle;

    fn apply_defaults(&self, bundle: &mut Bundle) {
        let Some(formats) = bundle.spec.target.additional_formats.as_mut() else {
            return;
        };

        let _entered = self.span.enter();

        if let Some(jks) = formats.jks.as_mut()
            && jks.password_hash.is_none()
        {
            info!(field = "jks.passwordHash", "defaulting password hash");
            jks.password_hash = Some(self.hasher.hash(jks.effective_password()));
        }

        if let Some(pkcs12) = formats.pkcs12.as_mut()
            && pkcs12.password_hash.is_none()
        {
            info!(field = "pkcs12.passwordHash", "defaulting password hash");
            pkcs12.password_hash = Some(self.hasher.hash(pkcs12.effective_password()));
        }
    }
}
