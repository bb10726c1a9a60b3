// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use bucket_cleaner_lambda::{CustomResourceEvent, HttpResponder, S3BucketEmptier, TeardownHandler};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let log_stream = std::env::var("AWS_LAMBDA_LOG_STREAM_NAME").unwrap_or_default();
    let sdk_config = aws_config::load_from_env().await;
    let handler = TeardownHandler::new(
        S3BucketEmptier::new(&sdk_config),
        HttpResponder::default(),
        log_stream,
    );

    let handler = &handler;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<CustomResourceEvent>| async move {
        handler.handle(event.payload).await.map_err(Error::from)
    }))
    .await
}
