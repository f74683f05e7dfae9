use crate::{Config, Result};
use std::path::Path;

/// Handles the `expendash init` command - creates the home directory and an
/// initial `config.json` pointing at the given backend.
pub async fn init(
    home: &Path,
    api_base_url: &str,
    share_url: Option<&str>,
) -> Result<super::Out<()>> {
    let config = Config::create(home, api_base_url, share_url).await?;
    Ok(super::Out::new_message(format!(
        "Initialized expendash home at '{}' for backend {}",
        config.root().display(),
        config.api_base_url()
    )))
}
