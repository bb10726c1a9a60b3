// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use cfn_risk_scanner::{CodePipelineEvent, PipelineScanner, ScannerConfig};
use cfn_risk_scanner_lambda::{
    handle_job, CodePipelineReporter, DynamoDbRuleTable, S3ArtifactStore,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let config = ScannerConfig::from_env()?;
    info!("Loading function with rules table marker {}", config.rules_table_marker);

    // No extra configuration is needed as long as the function's role has access to
    // the rules table, the report bucket and CodePipeline job results.
    let sdk_config = aws_config::load_from_env().await;
    let scanner = PipelineScanner::new(
        DynamoDbRuleTable::new(&sdk_config),
        S3ArtifactStore::new(&sdk_config),
        CodePipelineReporter::new(&sdk_config),
        config,
    );

    let scanner = &scanner;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<CodePipelineEvent>| async move {
        handle_job(scanner, event.payload).await
    }))
    .await
}
