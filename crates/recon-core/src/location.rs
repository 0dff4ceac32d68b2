use std::path::PathBuf;

use url::Url;

/// Scheme of a location that is not on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedScheme(pub String);

/// Maps a rendered location to a local path. Plain paths pass through, `file://`
/// URLs are converted, and any other scheme (`hdfs://`, `s3://`, ...) is rejected.
pub fn local_path(location: &str) -> Result<PathBuf, UnsupportedScheme> {
    if !location.contains("://") {
        return Ok(PathBuf::from(location));
    }
    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| UnsupportedScheme(format!("file (malformed url {location})"))),
        Ok(url) => Err(UnsupportedScheme(url.scheme().to_string())),
        Err(_) => Err(UnsupportedScheme(
            location
                .split_once("://")
                .map(|(scheme, _)| scheme.to_string())
                .unwrap_or_default(),
        )),
    }
}
