//! TLS trust configuration.
//!
//! Root certificates come from the first source that applies:
//!
//! 1. the CA file configured on the client
//! 2. the CA directory configured on the client
//! 3. the system bundle at [`SYSTEM_CA_FILE`], if it exists
//! 4. the system directory at [`SYSTEM_CA_PATH`], if it exists
//! 5. the roots built into the TLS backend

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use reqwest::{Certificate, ClientBuilder};
use std::path::{Path, PathBuf};

use crate::config::ClientOptions;
use crate::runtime::Runtime;

pub const SYSTEM_CA_FILE: &str = "/usr/lib/ssl/certs/ca-certificates.crt";
pub const SYSTEM_CA_PATH: &str = "/usr/lib/ssl/certs";

/// Where trusted root certificates are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustSource {
    /// A PEM bundle file.
    CaFile(PathBuf),
    /// A directory of PEM files.
    CaPath(PathBuf),
    /// The TLS backend's built-in roots.
    BuiltIn,
}

pub fn resolve_trust_source<R: Runtime + ?Sized>(
    runtime: &R,
    options: &ClientOptions,
) -> TrustSource {
    if let Some(ca_file) = options.ca_file() {
        return TrustSource::CaFile(ca_file.to_path_buf());
    }
    if let Some(ca_path) = options.ca_path() {
        return TrustSource::CaPath(ca_path.to_path_buf());
    }

    let system_file = Path::new(SYSTEM_CA_FILE);
    if runtime.exists(system_file) {
        return TrustSource::CaFile(system_file.to_path_buf());
    }

    let system_path = Path::new(SYSTEM_CA_PATH);
    if runtime.is_dir(system_path) {
        return TrustSource::CaPath(system_path.to_path_buf());
    }

    TrustSource::BuiltIn
}

/// Reads the root certificates for `source`.
///
/// Directory entries that are not PEM (hash symlinks to directories,
/// README files and the like) are skipped.
pub fn load_certificates<R: Runtime + ?Sized>(
    runtime: &R,
    source: &TrustSource,
) -> Result<Vec<Certificate>> {
    match source {
        TrustSource::CaFile(path) => {
            let bundle = runtime.read(path)?;
            let certs = Certificate::from_pem_bundle(&bundle)
                .with_context(|| format!("Failed to parse CA file {:?}", path))?;
            if certs.is_empty() {
                bail!("No certificates found in CA file {:?}", path);
            }
            debug!("Loaded {} certificate(s) from {:?}", certs.len(), path);
            Ok(certs)
        }
        TrustSource::CaPath(dir) => {
            let mut entries = runtime.read_dir(dir)?;
            entries.sort();

            let mut certs = Vec::new();
            for entry in entries {
                if runtime.is_dir(&entry) {
                    continue;
                }
                let parsed = runtime
                    .read(&entry)
                    .and_then(|pem| Ok(Certificate::from_pem_bundle(&pem)?));
                match parsed {
                    Ok(found) => certs.extend(found),
                    Err(e) => debug!("Skipping {:?}: {}", entry, e),
                }
            }

            if certs.is_empty() {
                bail!("No certificates found in CA directory {:?}", dir);
            }
            debug!("Loaded {} certificate(s) from {:?}", certs.len(), dir);
            Ok(certs)
        }
        TrustSource::BuiltIn => Ok(Vec::new()),
    }
}

/// Installs the resolved trust store on `builder`.
///
/// A resolved CA source replaces the built-in roots rather than adding to
/// them. Load failures of a configured source are errors; an autodetected
/// system source that fails to load falls back to the built-in roots.
pub fn configure_trust<R: Runtime + ?Sized>(
    builder: ClientBuilder,
    runtime: &R,
    options: &ClientOptions,
) -> Result<ClientBuilder> {
    let source = resolve_trust_source(runtime, options);
    debug!("Using TLS trust source {:?}", source);

    if source == TrustSource::BuiltIn {
        return Ok(builder);
    }

    let autodetected = options.ca_file().is_none() && options.ca_path().is_none();
    let certs = match load_certificates(runtime, &source) {
        Ok(certs) => certs,
        Err(e) if autodetected => {
            warn!("Ignoring system CA certificates ({}), using built-in roots", e);
            return Ok(builder);
        }
        Err(e) => return Err(e),
    };

    let builder = certs
        .into_iter()
        .fold(builder, |builder, cert| builder.add_root_certificate(cert));

    Ok(builder.tls_built_in_root_certs(false))
}
