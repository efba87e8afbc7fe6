use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PathreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PathreelError::capability("x")
            .to_string()
            .contains("capability error:")
    );
    assert!(
        PathreelError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert!(PathreelError::render("x").to_string().contains("render error:"));
    assert!(PathreelError::not_found("x").to_string().contains("not found:"));
    assert!(
        PathreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PathreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn classification_helpers() {
    assert!(PathreelError::validation("no routes").is_validation());
    assert!(!PathreelError::encoding("exit 1").is_validation());
    assert!(PathreelError::not_found("job").is_not_found());
    assert!(PathreelError::Cancelled.is_cancelled());
    assert_eq!(PathreelError::Cancelled.to_string(), "export cancelled");
}

#[test]
fn json_errors_map_to_serde() {
    let err: PathreelError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, PathreelError::Serde(_)));
}
