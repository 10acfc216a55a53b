//! # 日志配置模块
//!
//! 基于 `tracing-subscriber` 的紧凑格式输出，`RUST_LOG` 优先于配置文件中的级别

use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 默认过滤规则
#[must_use]
pub fn default_filter(level: Option<&str>) -> String {
    let level = level.unwrap_or("info");
    format!("{level},oauth_connect=debug,hyper=warn,reqwest=warn")
}

/// 初始化日志系统
///
/// 重复调用时保持第一次的设置
pub fn init_logging(level: Option<&str>) {
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!("日志系统初始化完成");
    }
}

/// 环境变量设置指南
pub fn print_logging_help() {
    println!("📋 日志配置指南:");
    println!("  RUST_LOG=info                      # 标准日志级别");
    println!("  RUST_LOG=oauth_connect=trace       # 客户端详细追踪");
    println!("  RUST_LOG=info,reqwest=debug        # 查看 HTTP 客户端日志");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(
            default_filter(None),
            "info,oauth_connect=debug,hyper=warn,reqwest=warn"
        );
        assert!(default_filter(Some("warn")).starts_with("warn,"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(Some("debug"));
        init_logging(None);
    }
}
