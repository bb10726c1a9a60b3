// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod event;
pub mod handler;
pub mod responder;
pub mod s3;

pub use crate::errors::Error;
pub use crate::event::{CfnResponse, CustomResourceEvent, RequestType, ResponseStatus};
pub use crate::handler::TeardownHandler;
pub use crate::responder::{HttpResponder, ResponseSender};
pub use crate::s3::{BucketEmptier, S3BucketEmptier};
