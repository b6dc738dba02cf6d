// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leakrs::utils::telemetry;

#[test]
fn test_telemetry_initialization() {
    telemetry::init_telemetry("info", false);
    // A second call only reports that a subscriber is already set
    telemetry::init_telemetry("debug", true);

    tracing::info!(rank = 1, workload_uuid = "w1", "Structured log line");
    tracing::debug!("Debug message");
}
