// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Could not parse any transactions")]
    NoTransactionsParsed,
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type FinanceResult<T> = Result<T, FinanceError>;
