use anyhow::Result;
use tempdir::TempDir;

use super::AnonymousIdentity;

#[tokio::test]
async fn it_creates_and_reuses_identity() -> Result<()> {
    let tmp_dir = TempDir::new("anonymous")?;
    let anonymous = AnonymousIdentity::new(tmp_dir.path().join("nested/anonymous-id"));

    let first = anonymous.load_or_create().await?;
    let second = anonymous.load_or_create().await?;

    assert!(first.anonymous);
    assert!(first.id.starts_with("anonymous_"));
    assert_eq!(first, second);

    return Ok(());
}

#[tokio::test]
async fn it_replaces_blank_file() -> Result<()> {
    let tmp_dir = TempDir::new("anonymous")?;
    let file_path = tmp_dir.path().join("anonymous-id");
    std::fs::write(&file_path, "  \n")?;

    let identity = AnonymousIdentity::new(file_path.clone())
        .load_or_create()
        .await?;

    assert!(identity.id.starts_with("anonymous_"));
    assert_eq!(std::fs::read_to_string(file_path)?, identity.id);

    return Ok(());
}
