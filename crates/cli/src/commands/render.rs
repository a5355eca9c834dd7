//! `clinicshop render <target>`

use std::io::Write;

use url::Url;

use clinicshop_core::{Credentials, Location};
use clinicshop_storefront::{App, ShellConfig};

use super::CommandError;

/// Render `target` to HTML on stdout, optionally after an admin login.
pub async fn render(target: &str, login: Option<(String, String)>) -> Result<(), CommandError> {
    let config = ShellConfig::from_env()?;
    let mut app = App::from_config(config)?;
    app.start().await;

    if let Some((email, password)) = login {
        let credentials = Credentials::new(&email, password)?;
        app.session().login(&credentials).await?;
    }

    let path = target_path(target)?;
    tracing::debug!(%path, "rendering");
    let frame = app.navigate(&path);
    let html = frame.to_html()?;

    writeln!(std::io::stdout().lock(), "{html}")?;
    Ok(())
}

/// Accept either a plain path or a hash-routed URL.
fn target_path(target: &str) -> Result<String, CommandError> {
    if target.starts_with("http://") || target.starts_with("https://") {
        let url = Url::parse(target)?;
        Ok(Location::from_url(&url).path().to_string())
    } else {
        Ok(target.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_reads_hash_url() {
        assert_eq!(
            target_path("https://clinic.example/#/products/42").unwrap(),
            "/products/42"
        );
        assert_eq!(target_path("https://clinic.example/").unwrap(), "/");
        assert_eq!(target_path("/cart").unwrap(), "/cart");
    }

    #[test]
    fn test_target_path_rejects_bad_url() {
        assert!(target_path("https://").is_err());
    }
}
