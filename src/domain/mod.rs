// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod llm;
pub mod model;

pub use error::GatewayError;
pub use llm::{ChatProvider, ImageAttachment, ImageMediaType, ImageSource};
pub use model::{ModelCatalog, ModelDescriptor, ProviderKind};
