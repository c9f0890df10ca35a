//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, route shape and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("gateway.route: '{0}' must start with '/'")]
    InvalidRoute(String),

    #[error("gateway.method: '{0}' must have the form Service.Method")]
    InvalidMethod(String),

    #[error("observability.log_level: '{0}' is not one of off, error, warn, info, debug, trace")]
    InvalidLogLevel(String),

    #[error("{0}: must be greater than zero")]
    Zero(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "gateway.bind_address", &config.gateway.bind_address);
    check_addr(&mut errors, "rpc.bind_address", &config.rpc.bind_address);
    check_host_port(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if !config.gateway.route.starts_with('/') {
        errors.push(ValidationError::InvalidRoute(config.gateway.route.clone()));
    }

    match config.gateway.method.split_once('.') {
        Some((service, method)) if !service.is_empty() && !method.is_empty() => {}
        _ => errors.push(ValidationError::InvalidMethod(config.gateway.method.clone())),
    }

    if config.observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.rpc.max_frame_bytes == 0 {
        errors.push(ValidationError::Zero("rpc.max_frame_bytes"));
    }
    if config.upstream.max_frame_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.max_frame_bytes"));
    }
    if config.upstream.connect_timeout_ms == Some(0) {
        errors.push(ValidationError::Zero("upstream.connect_timeout_ms"));
    }
    if config.upstream.call_timeout_ms == Some(0) {
        errors.push(ValidationError::Zero("upstream.call_timeout_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Like `check_addr`, but the host may be a name to resolve at dial time.
fn check_host_port(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = match value.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    };
    if !valid {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
