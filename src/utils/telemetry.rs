// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 构造默认的日志过滤指令
///
/// `RUST_LOG` 未设置时使用，`leakrs` 自身至少输出 debug 级别
pub fn default_directive(level: &str) -> String {
    let level = level.trim().to_lowercase();
    let crate_level = match level.as_str() {
        "trace" => "trace",
        _ => "debug",
    };
    format!("{},leakrs={}", level, crate_level)
}

pub fn init_telemetry(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let registry = tracing_subscriber::registry().with(filter);
    // try_init: tests and embedded callers may already own a global subscriber
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already initialised: {}", e);
    }
}
