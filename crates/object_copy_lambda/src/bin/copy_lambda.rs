use lambda_runtime::{service_fn, Error, LambdaEvent};
use object_copy_lambda::adapters::object_store::ObjectCopier;
use object_copy_lambda::handlers::copy::handle_invocation;
use object_copy_lambda::runtime::config::{CopyConfig, OUTPUT_BUCKET_ENV};
use object_copy_lambda::runtime::plan::CopyRequest;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

struct S3ObjectCopier {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectCopier for S3ObjectCopier {
    fn copy_object(&self, request: &CopyRequest) -> Result<(), String> {
        let bucket = request.destination.bucket.clone();
        let object_key = request.destination.key.clone();
        let copy_source = request.copy_source();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .copy_object()
                    .bucket(bucket)
                    .key(object_key)
                    .copy_source(copy_source)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to copy object in s3: {error}"))
            })
        })
    }
}

struct RuntimeDependencies {
    config: CopyConfig,
    copier: S3ObjectCopier,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<(), Error> {
    handle_invocation(event.payload, &deps.config, &deps.copier)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = CopyConfig::from_env();
    if !config.has_output_bucket() {
        tracing::warn!(
            "{OUTPUT_BUCKET_ENV} is not configured, copies will target an empty bucket name"
        );
    }

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        copier: S3ObjectCopier {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
