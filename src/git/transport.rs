//! Transport policy for talking to the upstream remote.
//!
//! Remotes are reached over SSH only, authenticated through the SSH agent, and
//! the server must present an SSH host key. The functions here only decide;
//! the gateway turns a rejection into an error for the caller.

use git2::cert::Cert;
use git2::CredentialType;

use crate::error::{Result, TaggerError};

/// Kind of certificate presented by a remote during connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    Hostkey,
    X509,
    Other,
}

impl CertificateKind {
    pub fn of(cert: &Cert<'_>) -> Self {
        if cert.as_hostkey().is_some() {
            CertificateKind::Hostkey
        } else if cert.as_x509().is_some() {
            CertificateKind::X509
        } else {
            CertificateKind::Other
        }
    }
}

/// Outcome of a certificate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateDecision {
    Accept,
    Reject(String),
}

/// Only SSH host keys are accepted; there is no HTTPS fallback.
pub fn check_certificate(kind: CertificateKind, host: &str) -> CertificateDecision {
    match kind {
        CertificateKind::Hostkey => CertificateDecision::Accept,
        CertificateKind::X509 => CertificateDecision::Reject(format!(
            "{} presented an X.509 certificate; HTTPS remotes are not supported, use SSH",
            host
        )),
        CertificateKind::Other => CertificateDecision::Reject(format!(
            "{} presented an unsupported certificate; only SSH host keys are accepted",
            host
        )),
    }
}

/// Which credential to hand to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialDecision {
    /// Send the user name only (libgit2 asks for it before the key when the URL has none)
    Username(String),
    SshAgent(String),
    Reject(String),
}

/// Pick the credential for one request from the transport.
///
/// `agent_attempts` is how many agent credentials this connection already
/// handed out. libgit2 asks again after every rejected key, so a second agent
/// request means the agent has nothing the server accepts.
pub fn select_credential(
    username_from_url: Option<&str>,
    allowed: CredentialType,
    agent_attempts: u32,
) -> CredentialDecision {
    let username = username_from_url.unwrap_or("git").to_string();

    if allowed.contains(CredentialType::SSH_KEY) {
        if agent_attempts > 0 {
            return CredentialDecision::Reject(format!(
                "SSH agent authentication failed for user '{}'; no key in the agent was accepted",
                username
            ));
        }
        CredentialDecision::SshAgent(username)
    } else if allowed.contains(CredentialType::USERNAME) {
        CredentialDecision::Username(username)
    } else {
        CredentialDecision::Reject(
            "remote does not accept SSH key authentication; only the SSH agent is supported"
                .to_string(),
        )
    }
}

/// Reject any remote URL that would not be reached over SSH
pub fn check_remote_url(url: &str) -> Result<()> {
    if is_ssh_url(url) {
        Ok(())
    } else {
        Err(TaggerError::configuration(format!(
            "Remote URL '{}' is not an SSH URL; only SSH remotes are supported",
            url
        )))
    }
}

fn is_ssh_url(url: &str) -> bool {
    if let Some((scheme, rest)) = url.split_once("://") {
        return matches!(scheme, "ssh" | "ssh+git" | "git+ssh") && !rest.is_empty();
    }

    // scp-like syntax: [user@]host:path
    match url.split_once(':') {
        Some((host, path)) => {
            !host.is_empty()
                && !path.is_empty()
                && !host.contains('/')
                && !host.contains('\\')
                && host.len() > 1
        }
        None => false,
    }
}
