// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire-level building blocks shared by the udplogger publisher daemon and
//! the receiver client library: protocol constants, beacon payloads, log
//! datagram framing, the log-line projection and UDP socket setup.

pub mod beacon;
pub mod constants;
pub mod entry;
pub mod errors;
pub mod frame;
pub mod socket;
pub mod trim;
