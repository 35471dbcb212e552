// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Unified REST gateway in front of heterogeneous LLM providers.
//!
//! One request shape, four backends: OpenAI, Azure OpenAI, Anthropic,
//! and AWS Bedrock (Claude and Llama families). The layering follows
//! domain / application / infrastructure / presentation: the domain
//! defines the catalog and the provider capability contract, the
//! infrastructure holds one anti-corruption adapter per backend, the
//! application layer dispatches requests, and the presentation layer is
//! the Axum HTTP surface.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
