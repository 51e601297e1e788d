//! API types served by the webhook

pub mod v1alpha1;
