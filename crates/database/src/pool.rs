use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use std::fs::File;
use std::io::BufReader;
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Connection pool type alias
pub type DbPool = Pool;

/// Create a connection pool from configuration and verify connectivity with
/// a single checkout.
pub async fn create_pool(db_config: &config::DatabaseConfig) -> anyhow::Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(db_config.host.clone());
    cfg.port = Some(db_config.port);
    cfg.dbname = Some(db_config.database.clone());
    cfg.user = Some(db_config.username.clone());
    cfg.password = Some(db_config.password.clone());
    cfg.pool = Some(PoolConfig::new(db_config.max_connections as usize));

    let pool = if db_config.tls_enabled {
        create_pool_with_rustls(cfg, db_config.tls_ca_cert_path.as_deref())?
    } else {
        debug!("TLS disabled, connecting with NoTls");
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))?
    };

    // Fail fast on bad credentials/host instead of at first request
    let _ = pool.get().await?;

    Ok(pool)
}

/// Create pool using rustls with either custom certificate or platform verifier
pub fn create_pool_with_rustls(cfg: Config, cert_path: Option<&str>) -> anyhow::Result<Pool> {
    use tokio_postgres_rustls::MakeRustlsConnect;

    // Install the default crypto provider (ring) if not already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    let client_config = if let Some(cert_path) = cert_path {
        info!(
            "Using rustls with custom CA certificate from: {}",
            cert_path
        );

        let cert_file = File::open(cert_path)
            .map_err(|e| anyhow::anyhow!("Failed to open certificate file {}: {}", cert_path, e))?;
        let mut reader = BufReader::new(cert_file);

        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Failed to parse certificate: {}", e))?;

        if certs.is_empty() {
            return Err(anyhow::anyhow!("No certificates found in {}", cert_path));
        }

        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs {
            root_store
                .add(cert)
                .map_err(|e| anyhow::anyhow!("Failed to add certificate to root store: {}", e))?;
        }

        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    } else {
        // OS-native verification, includes revocation checking via OCSP/CRLs
        info!("Using rustls with platform verifier (OS certificate store)");

        use rustls_platform_verifier::ConfigVerifierExt;
        rustls::ClientConfig::with_platform_verifier()
    };

    let tls = MakeRustlsConnect::new(client_config);

    cfg.create_pool(Some(Runtime::Tokio1), tls)
        .map_err(|e| anyhow::anyhow!("Failed to create TLS pool: {}", e))
}
