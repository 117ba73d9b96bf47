//! Randomness providers.
//!
//! [`QuantumRandomProvider`] asks the ANU quantum random number service for
//! fresh uint16 values and degrades to the operating system CSPRNG when the
//! service is unreachable or answers with anything unexpected.
//! [`LocalRandomProvider`] only uses the CSPRNG.

use async_trait::async_trait;
use rand::RngCore;
use rand::rngs::OsRng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tarot_core::config::QuantumConfig;
use tarot_core::error::{Result, TarotError};
use tarot_core::ports::RandomnessProvider;

/// Which source served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropySource {
    Quantum,
    Local,
}

#[derive(Debug, Deserialize)]
struct QrngResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Vec<u16>>,
}

/// Checks a QRNG response body and returns its values.
///
/// Rejects `success == false`, a missing data array, values outside the
/// uint16 range and a length other than `count`.
pub fn validate_payload(body: &str, count: usize) -> std::result::Result<Vec<u32>, String> {
    let parsed: QrngResponse =
        serde_json::from_str(body).map_err(|e| format!("Invalid quantum payload: {e}"))?;

    if !parsed.success {
        return Err("Quantum service reported failure".to_string());
    }
    let data = parsed
        .data
        .ok_or_else(|| "Quantum payload has no data".to_string())?;
    if data.len() != count {
        return Err(format!(
            "Quantum payload length mismatch: expected {count}, got {}",
            data.len()
        ));
    }
    Ok(data.into_iter().map(u32::from).collect())
}

/// Draws `count` uint16 values from the OS CSPRNG.
pub fn local_random_values(count: usize) -> Result<Vec<u32>> {
    let mut bytes = vec![0u8; count * 2];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TarotError::randomness(format!("OS random source unavailable: {e}")))?;

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u32::from(u16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}

/// Quantum random numbers with CSPRNG fallback.
#[derive(Clone)]
pub struct QuantumRandomProvider {
    client: Client,
    endpoint: String,
    enabled: bool,
    timeout: Duration,
}

impl QuantumRandomProvider {
    pub fn new(config: &QuantumConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            enabled: config.enabled,
            timeout: config.timeout(),
        }
    }

    async fn fetch_quantum(&self, count: usize) -> std::result::Result<Vec<u32>, String> {
        let millis = chrono::Utc::now().timestamp_millis();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("length", count.to_string()),
                ("type", "uint16".to_string()),
                ("_t", millis.to_string()),
            ])
            .header("Pragma", "no-cache")
            .header("Cache-Control", "no-cache, no-store, must-revalidate")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("Quantum request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Quantum API status: {status}"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read quantum response: {e}"))?;
        validate_payload(&body, count)
    }

    /// Like [`RandomnessProvider::acquire`], also reporting the source used.
    pub async fn acquire_with_source(&self, count: usize) -> Result<(Vec<u32>, EntropySource)> {
        if self.enabled {
            match self.fetch_quantum(count).await {
                Ok(values) => {
                    tracing::info!("[Quantum] Acquired {} values from quantum source", count);
                    return Ok((values, EntropySource::Quantum));
                }
                Err(e) => {
                    tracing::warn!("[Quantum] Falling back to local CSPRNG: {}", e);
                }
            }
        } else {
            tracing::debug!("[Quantum] Quantum source disabled, using local CSPRNG");
        }

        let values = local_random_values(count)?;
        Ok((values, EntropySource::Local))
    }
}

#[async_trait]
impl RandomnessProvider for QuantumRandomProvider {
    async fn acquire(&self, count: usize) -> Result<Vec<u32>> {
        self.acquire_with_source(count)
            .await
            .map(|(values, _)| values)
    }
}

/// CSPRNG-only provider, for offline use.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRandomProvider;

#[async_trait]
impl RandomnessProvider for LocalRandomProvider {
    async fn acquire(&self, count: usize) -> Result<Vec<u32>> {
        local_random_values(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_payload() {
        assert_eq!(
            validate_payload(r#"{"type":"uint16","length":3,"data":[1,65535,7],"success":true}"#, 3),
            Ok(vec![1, 65535, 7])
        );
        assert!(validate_payload(r#"{"data":[1,2,3],"success":false}"#, 3).is_err());
        assert!(validate_payload(r#"{"data":[1,2],"success":true}"#, 3).is_err());
        assert!(validate_payload(r#"{"success":true}"#, 3).is_err());
        assert!(validate_payload("<html>rate limited</html>", 3).is_err());
        assert!(validate_payload(r#"{"data":[1,65536,7],"success":true}"#, 3).is_err());
        assert!(validate_payload(r#"{"data":[1,-2,7],"success":true}"#, 3).is_err());
    }

    #[test]
    fn test_local_values_are_uint16() {
        let values = local_random_values(78).unwrap();
        assert_eq!(values.len(), 78);
        assert!(values.iter().all(|v| *v <= u32::from(u16::MAX)));
    }

    #[tokio::test]
    async fn test_disabled_provider_uses_local_source() {
        let config = QuantumConfig {
            enabled: false,
            ..QuantumConfig::default()
        };
        let provider = QuantumRandomProvider::new(&config);
        let (values, source) = provider.acquire_with_source(78).await.unwrap();
        assert_eq!(values.len(), 78);
        assert_eq!(source, EntropySource::Local);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let config = QuantumConfig {
            enabled: true,
            endpoint: "http://127.0.0.1:9/API/jsonI.php".to_string(),
            timeout_secs: 2,
        };
        let provider = QuantumRandomProvider::new(&config);
        let (values, source) = provider.acquire_with_source(78).await.unwrap();
        assert_eq!(values.len(), 78);
        assert_eq!(source, EntropySource::Local);
    }

    #[tokio::test]
    async fn test_local_provider() {
        assert_eq!(LocalRandomProvider.acquire(5).await.unwrap().len(), 5);
    }
}
