use aws_sdk_s3::primitives::ByteStream;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use protodecode_lambda::adapters::clock::SystemClock;
use protodecode_lambda::adapters::object_store::ObjectStore;
use protodecode_lambda::config::TransformConfig;
use protodecode_lambda::handlers::stream::{handle_stream_event, TransformResponse};
use protodecode_lambda::runtime::decode::RecordDecoder;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}

struct RuntimeDependencies {
    config: TransformConfig,
    decoder: RecordDecoder,
    store: S3ObjectStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<TransformResponse, Error> {
    let response = handle_stream_event(
        &event.payload,
        &deps.decoder,
        &deps.config,
        &SystemClock,
        &deps.store,
    )?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .without_time()
        .init();

    let config = TransformConfig::from_env()?;
    let decoder = RecordDecoder::for_demo_schema()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        store: S3ObjectStore {
            bucket: config.bucket.clone(),
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        config,
        decoder,
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
