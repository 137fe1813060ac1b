use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::digest::{digest, SHA256};
use std::env;
use std::path::Path;
use tracing::info;
use wtransport::Identity;

// Dev certificate paths, generated on first run when no cert is configured
const DEV_CERT_FILE: &str = "certs/cert.pem";
const DEV_KEY_FILE: &str = "certs/key.pem";

/// TLS configuration for the WebTransport endpoint
pub struct TlsConfig {
    /// The wtransport Identity containing certificate and key
    pub identity: Identity,
    /// Base64-encoded SHA-256 hash of the certificate (for browser flags)
    pub cert_hash: String,
}

impl TlsConfig {
    /// Load TLS configuration.
    ///
    /// Production: set TLS_CERT_PATH and TLS_KEY_PATH.
    /// Development: a self-signed localhost certificate is generated into
    /// `certs/` on first run and reused afterwards.
    pub async fn load() -> Result<Self> {
        if let (Ok(cert_path), Ok(key_path)) =
            (env::var("TLS_CERT_PATH"), env::var("TLS_KEY_PATH"))
        {
            info!("Loading TLS certificate from environment paths");
            return Self::load_from_paths(&cert_path, &key_path).await;
        }

        ensure_dev_certificate()?;
        Self::load_from_paths(DEV_CERT_FILE, DEV_KEY_FILE).await
    }

    /// Load certificate from PEM file paths
    async fn load_from_paths(cert_path: &str, key_path: &str) -> Result<Self> {
        let identity = Identity::load_pemfiles(cert_path, key_path)
            .await
            .context("Failed to load certificate from PEM files")?;

        let cert_hash = compute_cert_hash(&identity);
        Ok(Self {
            identity,
            cert_hash,
        })
    }

    /// Get the certificate hash for client configuration
    pub fn get_cert_hash(&self) -> &str {
        &self.cert_hash
    }
}

/// Generate a self-signed certificate for localhost development into
/// `certs/` unless one is already there.
///
/// Validity is capped at 14 days: browsers reject longer-lived certificates
/// for WebTransport's serverCertificateHashes. The existence check and the
/// writes sit under one lock so concurrent loads cannot interleave them.
fn ensure_dev_certificate() -> Result<()> {
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

    static GEN_LOCK: Mutex<()> = Mutex::new(());
    let _guard = GEN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if Path::new(DEV_CERT_FILE).exists() && Path::new(DEV_KEY_FILE).exists() {
        return Ok(());
    }

    info!("Generating dev certificate for localhost in certs/");
    std::fs::create_dir_all("certs")?;

    let mut params =
        CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()])?;
    params.distinguished_name = DistinguishedName::new();
    params
        .distinguished_name
        .push(DnType::CommonName, "Photon Arena Dev");
    params
        .distinguished_name
        .push(DnType::OrganizationName, "Development");

    let now = SystemTime::now();
    let fourteen_days = Duration::from_secs(14 * 24 * 60 * 60);
    params.not_before = now.into();
    params.not_after = (now + fourteen_days).into();

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    std::fs::write(DEV_CERT_FILE, cert.pem())?;
    std::fs::write(DEV_KEY_FILE, key_pair.serialize_pem())?;
    Ok(())
}

fn compute_cert_hash(identity: &Identity) -> String {
    identity
        .certificate_chain()
        .as_slice()
        .first()
        .map(|cert| {
            let hash = digest(&SHA256, cert.der());
            STANDARD.encode(hash.as_ref())
        })
        .unwrap_or_default()
}
