// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Error Types
//!
//! Errors shared by the model, runtime and predictor crates.
//!
//! - [`LoadError`] covers fetching and decoding the model artifact. It is
//!   `Clone` because a single load outcome is broadcast to every request that
//!   was waiting on it.
//! - [`InferenceError`] covers everything the inference engine can reject once
//!   a model is in hand.

use strum::IntoStaticStr;
use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Clone, Debug, Error, IntoStaticStr, PartialEq, Eq)]
pub enum LoadError {
    #[error("Invalid artifact locator: {0}")]
    InvalidLocator(String),
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("ObjectStore error: {0}")]
    ObjectStoreError(String),
    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),
    #[error("Incompatible artifact: {0}")]
    IncompatibleArtifact(String),
    #[error("Load interrupted before completion")]
    Interrupted,
}

pub type ModelResult<T> = Result<T, InferenceError>;

#[derive(Clone, Debug, Error, IntoStaticStr, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },
    #[error("Unsupported dtype: {0}")]
    FailedTypeVerification(String),
    #[error("Tensor data error: {0}")]
    TensorData(String),
    #[error("Model produced no output values")]
    EmptyOutput,
    #[error("Model produced a non-finite value at index {0}")]
    NonFiniteOutput(usize),
}
