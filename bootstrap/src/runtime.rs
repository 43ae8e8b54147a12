//! 进程级初始化

use furumaru_config::{AppConfig, TelemetryConfig};
use furumaru_telemetry::{init_metrics, init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

/// 初始化日志
pub fn init_telemetry(config: &TelemetryConfig) {
    if config.json {
        init_tracing_json(&config.log_level);
    } else {
        init_tracing(&config.log_level);
    }
}

/// 初始化运行时（日志 + metrics recorder）
///
/// 返回的 handle 由服务自己挂到 `/metrics` 上；recorder 已安装时返回 None
pub fn init_runtime(config: &AppConfig) -> Option<PrometheusHandle> {
    init_telemetry(&config.telemetry);

    let handle = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    };

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
    handle
}
