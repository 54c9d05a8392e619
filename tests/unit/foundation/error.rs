use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LastListenedError::config("x")
            .to_string()
            .contains("config error:")
    );
    assert!(
        LastListenedError::source_unavailable("x")
            .to_string()
            .contains("track source unavailable:")
    );
    assert!(
        LastListenedError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        LastListenedError::transfer("x")
            .to_string()
            .contains("transfer failed:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LastListenedError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn anyhow_context_converts_with_question_mark() {
    fn inner() -> LastListenedResult<()> {
        use anyhow::Context as _;
        std::fs::read("/definitely/not/here/lastlistened").context("read missing file")?;
        Ok(())
    }

    let err = inner().unwrap_err();
    assert!(matches!(err, LastListenedError::Other(_)));
    assert!(err.to_string().contains("read missing file"));
}
