use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one worker
/// - Queue coordinates, bucket and function name are set
/// - Queue ack wait outlasts the compute timeout
/// - Plan limits are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.workers.concurrency == 0 {
        return Err(invalid("workers.concurrency must be at least 1"));
    }

    for (name, value) in [
        ("queue.url", &config.queue.url),
        ("queue.stream", &config.queue.stream),
        ("queue.subject", &config.queue.subject),
        ("queue.consumer", &config.queue.consumer),
        ("storage.bucket", &config.storage.bucket),
        ("compute.endpoint", &config.compute.endpoint),
        ("compute.function_name", &config.compute.function_name),
    ] {
        if value.trim().is_empty() {
            return Err(invalid(&format!("{} cannot be empty", name)));
        }
    }

    // Otherwise the broker redelivers jobs that are still running
    if config.queue.ack_wait_secs == 0 {
        return Err(invalid("queue.ack_wait_secs must be greater than 0"));
    }
    if config.queue.ack_wait_secs <= config.compute.timeout_secs {
        return Err(invalid(&format!(
            "queue.ack_wait_secs ({}) must exceed compute.timeout_secs ({})",
            config.queue.ack_wait_secs, config.compute.timeout_secs
        )));
    }

    for (plan, limit) in config.plans.iter() {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(invalid(&format!(
                "plans.{} must be a positive number of seconds",
                plan
            )));
        }
    }

    if let Some(notifier) = &config.notifier {
        if notifier.from_address.trim().is_empty() {
            return Err(invalid("notifier.from_address cannot be empty"));
        }
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}
