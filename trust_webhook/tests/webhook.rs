use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use trust_webhook::password_hash::{HashPolynomial, PasswordHasher};
use trust_webhook::server::BUNDLE_MUTATE_PATH;
use trust_webhook::{BundleDefaulter, DefaultingHandler, HandlerError, WebhookServer};

fn server(polynomial: HashPolynomial) -> WebhookServer<HandlerError> {
    let defaulter = BundleDefaulter::new(tracing::Span::none(), PasswordHasher::new(polynomial));
    WebhookServer::builder().mutator(DefaultingHandler::new("bundle-defaulter", defaulter))
}

fn review(object: Value) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": { "group": "trust.cert-manager.io", "version": "v1alpha1", "kind": "Bundle" },
            "resource": { "group": "trust.cert-manager.io", "version": "v1alpha1", "resource": "bundles" },
            "name": "trust",
            "operation": "CREATE",
            "userInfo": { "username": "admin" },
            "object": object
        }
    })
}

fn bundle(additional_formats: Option<Value>) -> Value {
    let mut target = json!({ "configMap": { "key": "trust-bundle.pem" } });
    if let Some(formats) = additional_formats {
        target["additionalFormats"] = formats;
    }

    json!({
        "apiVersion": "trust.cert-manager.io/v1alpha1",
        "kind": "Bundle",
        "metadata": { "name": "trust" },
        "spec": {
            "sources": [{ "useDefaultCAs": true }],
            "target": target
        }
    })
}

async fn post(server: WebhookServer<HandlerError>, body: &Value) -> (u16, Value) {
    let routes = server.routes();
    let res = warp::test::request()
        .method("POST")
        .path(&format!("/{BUNDLE_MUTATE_PATH}"))
        .json(body)
        .reply(&routes)
        .await;

    let status = res.status().as_u16();
    let body = serde_json::from_slice(res.body()).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_missing_hash_is_patched() {
    let body = review(bundle(Some(json!({
        "jks": { "key": "bundle.jks", "password": "hunter2" }
    }))));

    let (status, reply) = post(server(HashPolynomial::Legacy), &body).await;

    assert_eq!(status, 200);
    assert_eq!(reply["kind"], "AdmissionReview");
    let response = &reply["response"];
    assert_eq!(response["uid"], "705ab4f5-6393-11e8-b7cc-42010a800002");
    assert_eq!(response["allowed"], true);
    assert_eq!(response["patchType"], "JSONPatch");

    let patch = STANDARD
        .decode(response["patch"].as_str().unwrap())
        .unwrap();
    let patch: Value = serde_json::from_slice(&patch).unwrap();
    assert_eq!(
        patch,
        json!([{
            "op": "add",
            "path": "/spec/target/additionalFormats/jks/passwordHash",
            "value": 4294967290u32
        }])
    );
}

#[tokio::test]
async fn test_bundle_without_additional_formats_is_allowed_unchanged() {
    let (status, reply) = post(server(HashPolynomial::Legacy), &review(bundle(None))).await;

    assert_eq!(status, 200);
    assert_eq!(reply["response"]["allowed"], true);
    assert!(reply["response"].get("patch").is_none());
}

#[tokio::test]
async fn test_existing_hashes_are_allowed_unchanged() {
    let body = review(bundle(Some(json!({
        "jks": { "key": "bundle.jks", "password": "x", "passwordHash": 42 },
        "pkcs12": { "key": "bundle.p12", "password": "x", "passwordHash": 42 }
    }))));

    let (_, reply) = post(server(HashPolynomial::Ieee), &body).await;

    assert_eq!(reply["response"]["allowed"], true);
    assert!(reply["response"].get("patch").is_none());
}

#[tokio::test]
async fn test_other_kinds_are_denied() {
    let body = review(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": "trust", "namespace": "cert-manager" },
        "data": { "ca.crt": "-----BEGIN CERTIFICATE-----" }
    }));

    let (status, reply) = post(server(HashPolynomial::Legacy), &body).await;

    assert_eq!(status, 200);
    assert_eq!(reply["response"]["allowed"], false);
    assert!(reply["response"].get("patch").is_none());
    assert!(
        reply.to_string().contains("expected a Bundle, but got a v1/ConfigMap"),
        "unexpected reply: {reply}"
    );
}

#[tokio::test]
async fn test_review_without_request_is_invalid() {
    let body = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview"
    });

    let (status, reply) = post(server(HashPolynomial::Legacy), &body).await;

    assert_eq!(status, 200);
    assert_eq!(reply["response"]["allowed"], false);
}

#[tokio::test]
async fn test_non_json_body_is_rejected() {
    let routes = server(HashPolynomial::Legacy).routes();

    let res = warp::test::request()
        .method("POST")
        .path(&format!("/{BUNDLE_MUTATE_PATH}"))
        .header("content-type", "application/json")
        .body("not json")
        .reply(&routes)
        .await;

    assert_eq!(res.status(), 400);
}
