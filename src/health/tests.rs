//! Unit tests for the health snapshot model.

use super::*;

fn wire_snapshot() -> &'static str {
    r#"{
        "health": {"status": "UP", "uptime": 12.5, "timestamp": "2026-10-17T08:00:00.000Z", "now": 1760688000000},
        "servicesConnected": {
            "tenantService": {"status": "UP", "uptime": 40, "timestamp": null, "now": 1760688000001},
            "masterService": {"status": null, "uptime": null, "timestamp": null, "now": 1760688000002}
        }
    }"#
}

// ============================================================================
// ServiceId
// ============================================================================

#[test]
fn test_target_pairing_is_symmetric_and_not_reflexive() {
    assert_eq!(ServiceId::Master.target(), ServiceId::Tenant);
    assert_eq!(ServiceId::Tenant.target(), ServiceId::Master);
    for service in ServiceId::ALL {
        assert_ne!(service.target(), service);
        assert_eq!(service.target().target(), service);
    }
}

#[test]
fn test_service_id_from_str() {
    assert_eq!("master".parse::<ServiceId>().unwrap(), ServiceId::Master);
    assert_eq!("TENANT".parse::<ServiceId>().unwrap(), ServiceId::Tenant);
    assert!("billing".parse::<ServiceId>().is_err());
}

#[test]
fn test_service_id_wire_keys() {
    assert_eq!(
        ServiceId::from_wire_key("tenantService"),
        Some(ServiceId::Tenant)
    );
    assert_eq!(
        ServiceId::from_wire_key("masterService"),
        Some(ServiceId::Master)
    );
    assert_eq!(ServiceId::from_wire_key("master"), Some(ServiceId::Master));
    assert_eq!(ServiceId::from_wire_key("authService"), None);
}

#[test]
fn test_service_id_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&ServiceId::Master).unwrap(),
        "\"master\""
    );
}

// ============================================================================
// Snapshot deserialization
// ============================================================================

#[test]
fn test_snapshot_from_wire_names() {
    let snapshot: HealthSnapshot = serde_json::from_str(wire_snapshot()).unwrap();

    assert_eq!(snapshot.own.status, HealthStatus::Up);
    assert_eq!(snapshot.own.uptime_seconds, Some(12.5));
    assert_eq!(snapshot.own.emitted_at_ms, Some(1760688000000));
    assert!(snapshot.own.observed_at.is_some());
    assert_eq!(snapshot.dependencies.len(), 2);
    assert!(snapshot.is_target_up(ServiceId::Master));
    assert!(!snapshot.is_target_up(ServiceId::Tenant));
}

#[test]
fn test_snapshot_from_descriptive_names() {
    let body = r#"{
        "own": {"status": "UP", "uptimeSeconds": 3, "observedAtEpochMs": 1760688000000, "emittedAtEpochMs": 1760688000010},
        "dependencies": {"tenant": {"status": "UP"}}
    }"#;
    let snapshot: HealthSnapshot = serde_json::from_str(body).unwrap();

    assert_eq!(snapshot.own.emitted_at_ms, Some(1760688000010));
    assert_eq!(
        snapshot.own.observed_at.map(|t| t.timestamp_millis()),
        Some(1760688000000)
    );
    assert!(snapshot.is_target_up(ServiceId::Master));
}

#[test]
fn test_null_and_unrecognised_status_is_unknown() {
    let health: ServerHealth = serde_json::from_str(r#"{"status": null}"#).unwrap();
    assert_eq!(health.status, HealthStatus::Unknown);

    let health: ServerHealth = serde_json::from_str(r#"{"status": "DOWN"}"#).unwrap();
    assert_eq!(health.status, HealthStatus::Unknown);

    let health: ServerHealth = serde_json::from_str("{}").unwrap();
    assert_eq!(health.status, HealthStatus::Unknown);
    assert!(health.emitted_at_ms.is_none());
}

#[test]
fn test_unparseable_timestamp_is_absent() {
    let health: ServerHealth =
        serde_json::from_str(r#"{"status": "UP", "timestamp": "yesterday"}"#).unwrap();
    assert!(health.observed_at.is_none());
    assert!(health.is_up());
}

#[test]
fn test_unknown_dependency_keys_are_dropped() {
    let body = r#"{
        "health": {"status": "UP"},
        "servicesConnected": {"authService": {"status": "UP"}, "tenantService": {"status": "UP"}}
    }"#;
    let snapshot: HealthSnapshot = serde_json::from_str(body).unwrap();
    assert_eq!(snapshot.dependencies.len(), 1);
    assert!(snapshot.dependencies.contains_key(&ServiceId::Tenant));
}

#[test]
fn test_snapshot_missing_own_is_rejected() {
    let body = r#"{"servicesConnected": {}}"#;
    assert!(serde_json::from_str::<HealthSnapshot>(body).is_err());
}

#[test]
fn test_snapshot_missing_dependencies_is_rejected() {
    let body = r#"{"health": {"status": "UP"}}"#;
    assert!(serde_json::from_str::<HealthSnapshot>(body).is_err());
}

#[test]
fn test_target_health_absent_when_not_reported() {
    let body = r#"{"health": {"status": "UP"}, "servicesConnected": {}}"#;
    let snapshot: HealthSnapshot = serde_json::from_str(body).unwrap();
    assert!(snapshot.target_health(ServiceId::Master).is_none());
    assert!(!snapshot.is_target_up(ServiceId::Master));
}

// ============================================================================
// Envelope parsing
// ============================================================================

#[test]
fn test_parse_poll_body_success() {
    let body = format!(r#"{{"success": true, "data": {}}}"#, wire_snapshot());
    let snapshot = parser::parse_poll_body(&body).unwrap();
    assert_eq!(snapshot.own.status, HealthStatus::Up);
}

#[test]
fn test_parse_poll_body_rejected() {
    let body = r#"{"success": false, "message": "database unavailable"}"#;
    let err = parser::parse_poll_body(body).unwrap_err();
    assert_eq!(err, ProbeError::Rejected("database unavailable".to_string()));
}

#[test]
fn test_parse_poll_body_missing_data() {
    let err = parser::parse_poll_body(r#"{"success": true}"#).unwrap_err();
    assert!(matches!(err, ProbeError::ParseError(_)));
}

#[test]
fn test_parse_poll_body_malformed_snapshot() {
    let body = r#"{"success": true, "data": {"health": {"status": "UP"}}}"#;
    let err = parser::parse_poll_body(body).unwrap_err();
    assert!(matches!(err, ProbeError::ParseError(_)));
}

#[test]
fn test_parse_poll_body_invalid_json() {
    let err = parser::parse_poll_body("<html>bad gateway</html>").unwrap_err();
    assert!(matches!(err, ProbeError::ParseError(_)));
}

#[test]
fn test_parse_stream_event() {
    let payload = format!(r#"{{"data": {}}}"#, wire_snapshot());
    let snapshot = parser::parse_stream_event(&payload).unwrap();
    assert_eq!(snapshot.own.emitted_at_ms, Some(1760688000000));
}

#[test]
fn test_parse_stream_event_without_data() {
    let err = parser::parse_stream_event(r#"{"ping": true}"#).unwrap_err();
    assert!(matches!(err, ProbeError::ParseError(_)));
}

#[test]
fn test_parse_error_body_uses_message() {
    let err = parser::parse_error_body(503, r#"{"success": false, "message": "maintenance"}"#);
    assert_eq!(
        err,
        ProbeError::HttpError {
            status: 503,
            message: "maintenance".to_string()
        }
    );
}

#[test]
fn test_parse_error_body_falls_back_to_default() {
    let err = parser::parse_error_body(502, "Bad Gateway");
    assert_eq!(err.to_string(), format!("HTTP error 502: {}", parser::DEFAULT_ERROR_MESSAGE));
}

// ============================================================================
// ProbeError
// ============================================================================

#[test]
fn test_error_timeout_display() {
    let err = ProbeError::Timeout(5);
    assert_eq!(err.to_string(), "request timeout after 5s");
}

#[test]
fn test_error_connection_display() {
    let err = ProbeError::ConnectionFailed("refused".to_string());
    assert_eq!(err.to_string(), "connection failed: refused");
}

#[test]
fn test_error_heartbeat_display() {
    let err = ProbeError::HeartbeatTimeout(1000);
    assert_eq!(err.to_string(), "heartbeat missed after 1000ms");
}
