//! # Schemaless Round-Trip Property
//!
//! A resource without bindings that echoes its document returns exactly the
//! document it was sent.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use proptest::prelude::*;
use serde_json::Value;
use tower::ServiceExt;

use jsonio_api::{resource, with_json_io, ApiError, JsonTranslator, RequestContext, Resource};
use jsonio_schema::SchemaRegistry;

struct Echo;

impl Resource for Echo {
    fn on_post(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let doc = cx.take_doc().unwrap_or_default();
        cx.set_result(doc);
        Ok(())
    }
}

fn app() -> Router {
    let routes = Router::new().route("/echo", resource(Echo));
    with_json_io(routes, JsonTranslator::new(SchemaRegistry::new()))
}

/// Strategy for JSON values without floats, which do not round-trip exactly.
fn json_value_no_floats() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| serde_json::json!(n)),
        "[a-zA-Z0-9_ \u{e9}\u{4e2d}]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(
        3,  // depth
        32, // desired size
        6,  // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

async fn echo(app: Router, doc: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(doc).unwrap()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever goes in comes back unchanged.
    #[test]
    fn schemaless_echo_is_identity(doc in json_value_no_floats()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (status, returned) = runtime.block_on(echo(app(), &doc));
        prop_assert_eq!(status, StatusCode::OK);
        prop_assert_eq!(returned, doc);
    }
}
