// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod codepipeline;
pub mod dynamodb;
pub mod handler;
pub mod s3;

pub use crate::codepipeline::CodePipelineReporter;
pub use crate::dynamodb::DynamoDbRuleTable;
pub use crate::handler::{handle_job, ScanOutput};
pub use crate::s3::S3ArtifactStore;
