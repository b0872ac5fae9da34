use bcstart::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let auth = Error::AuthenticationRequired;
    assert_eq!(auth.exit_code(), exit_codes::USER_ERROR);

    let policy = Error::ResetDisabled;
    assert_eq!(policy.exit_code(), exit_codes::POLICY_BLOCKED);

    let remote = Error::RemoteFailure("boom".to_string());
    assert_eq!(remote.exit_code(), exit_codes::OPERATION_FAILED);

    let timeout = Error::GenerationTimedOut(60);
    assert_eq!(timeout.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn kinds_group_not_found_variants() {
    for err in [
        Error::BusinessNotFound("b".to_string()),
        Error::TodoNotFound("t".to_string()),
        Error::SubAreaNotFound("s".to_string()),
        Error::FileNotFound("f".to_string()),
    ] {
        assert_eq!(err.kind(), "not_found");
        assert!(err.is_not_found());
    }
    assert_eq!(
        Error::ValidationFailed("x".to_string()).kind(),
        "validation_failed"
    );
    assert_eq!(Error::RemoteFailure("x".to_string()).kind(), "remote_failure");
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::InvalidTransition {
        from: "todo".to_string(),
        to: "done".to_string(),
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::POLICY_BLOCKED);
    assert_eq!(json.kind, "policy_blocked");
    assert!(json.error.contains("todo -> done"));
    let details = json.details.expect("details");
    assert_eq!(details["from"], "todo");
    assert_eq!(details["to"], "done");

    let plain = JsonError::from(&Error::TodoNotFound("01H".to_string()));
    assert!(plain.details.is_none());
    assert!(plain.error.contains("Todo not found"));
}
