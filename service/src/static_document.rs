use crate::config::Config;
use crate::error::{Error, ErrorKind};
use bytes::Bytes;
use log::*;

/// The chat client bundled with the relay, served at `/` unless overridden.
pub const BUNDLED_INDEX_HTML: &str = include_str!("../assets/index.html");

/// Loads the HTML document served at `/`.
///
/// The document is read once at startup; a configured path that cannot be read
/// is a startup failure rather than a per-request one.
pub async fn load_index_html(config: &Config) -> Result<Bytes, Error> {
    match config.index_html_path() {
        Some(path) => {
            let contents = tokio::fs::read(path)
                .await
                .map_err(|err| Error::new(ErrorKind::StaticDocument, err))?;
            info!(
                "Serving chat client from {} ({} bytes)",
                path.display(),
                contents.len()
            );
            Ok(Bytes::from(contents))
        }
        None => {
            debug!("Serving bundled chat client");
            Ok(Bytes::from_static(BUNDLED_INDEX_HTML.as_bytes()))
        }
    }
}
