use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::DemError;

/// Base URL of the public, anonymously-readable SRTM dataset mirror. Tiles
/// live under a per-hemisphere-row folder taken from the tile name's first
/// three characters, e.g. `N46W113.hgt.gz` lives under `N46/`.
pub const PUBLIC_SRTM_BASE_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/skadi";

/// Anonymous HTTP(S) fetch + gunzip of a public SRTM tile.
#[derive(Clone)]
pub struct SrtmFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl SrtmFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: PUBLIC_SRTM_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn tile_url(&self, tile_name: &str) -> String {
        let folder = &tile_name[..3];
        format!("{}/{}/{}.hgt.gz", self.base_url, folder, tile_name)
    }

    /// Fetches and decompresses `tile_name`, returning raw (not yet
    /// decoded) `.hgt` bytes.
    pub async fn fetch(&self, tile_name: &str) -> Result<Vec<u8>, DemError> {
        let url = self.tile_url(tile_name);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DemError::TransportError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DemError::TileNotFound {
                tile_name: tile_name.to_string(),
                url,
            });
        }
        if !response.status().is_success() {
            return Err(DemError::TransportError(format!(
                "unexpected status {} for {url}",
                response.status()
            )));
        }

        let compressed = response
            .bytes()
            .await
            .map_err(|e| DemError::TransportError(e.to_string()))?;

        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut raw = Vec::new();
        decoder
            .read_to_end(&mut raw)
            .map_err(|e| DemError::Corrupt(e.to_string()))?;

        if raw.is_empty() {
            return Err(DemError::Corrupt(format!("empty decompressed body for {url}")));
        }

        Ok(raw)
    }
}

impl Default for SrtmFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_url_derives_hemisphere_folder_from_prefix() {
        let fetcher = SrtmFetcher::with_base_url("https://example.test/srtm");
        assert_eq!(
            fetcher.tile_url("N46W113"),
            "https://example.test/srtm/N46/N46W113.hgt.gz"
        );
    }
}
