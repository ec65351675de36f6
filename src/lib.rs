// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budget;
pub mod chart;
pub mod cli;
pub mod commands;
pub mod csv_import;
pub mod db;
pub mod error;
pub mod models;
pub mod period;
pub mod rules;
pub mod store;
pub mod utils;
