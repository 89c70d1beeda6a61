// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod beacon;
pub mod config;
pub mod errors;
pub mod shipper;
pub mod targets;
