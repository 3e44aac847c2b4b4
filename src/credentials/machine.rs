//! Stable per-machine hardware identifier.

#[cfg(not(target_os = "windows"))]
use std::fs;
#[cfg(any(target_os = "macos", target_os = "windows"))]
use std::process::Command;

use super::error::{CredentialError, CredentialErrorCode};

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const MACHINE_ID_FILES: &[&str] = &["/var/lib/dbus/machine-id", "/etc/machine-id"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const BSD_HOST_ID_FILE: &str = "/etc/hostid";

/// Read this machine's identifier.
///
/// Linux and other Unix systems read the D-Bus / systemd machine-id files,
/// macOS queries `IOPlatformUUID` through `ioreg`, Windows reads
/// `MachineGuid` from the registry.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::MachineIdUnavailable`] when no identifier
/// can be found.
pub fn machine_id() -> Result<String, CredentialError> {
    let id = read_platform_id()?;
    let id = id.trim();
    if id.is_empty() {
        return Err(CredentialError::new(
            CredentialErrorCode::MachineIdUnavailable,
            "machine id is empty",
        ));
    }
    Ok(id.to_owned())
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn read_platform_id() -> Result<String, CredentialError> {
    let mut last_err = None;
    for path in MACHINE_ID_FILES.iter().chain(std::iter::once(&BSD_HOST_ID_FILE)) {
        match fs::read_to_string(path) {
            Ok(id) if !id.trim().is_empty() => return Ok(id),
            Ok(_) => {}
            Err(err) => last_err = Some(format!("{path}: {err}")),
        }
    }
    let err = CredentialError::new(
        CredentialErrorCode::MachineIdUnavailable,
        "no machine-id file found",
    );
    Err(match last_err {
        Some(cause) => err.with_cause(cause),
        None => err,
    })
}

#[cfg(target_os = "macos")]
fn read_platform_id() -> Result<String, CredentialError> {
    let output = Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .map_err(|err| {
            CredentialError::new(CredentialErrorCode::MachineIdUnavailable, "ioreg failed")
                .with_cause(err)
        })?;
    parse_ioreg_uuid(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        CredentialError::new(
            CredentialErrorCode::MachineIdUnavailable,
            "IOPlatformUUID not present in ioreg output",
        )
    })
}

#[cfg(target_os = "windows")]
fn read_platform_id() -> Result<String, CredentialError> {
    let output = Command::new("reg")
        .args([
            "query",
            r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Cryptography",
            "/v",
            "MachineGuid",
        ])
        .output()
        .map_err(|err| {
            CredentialError::new(CredentialErrorCode::MachineIdUnavailable, "reg query failed")
                .with_cause(err)
        })?;
    parse_registry_guid(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        CredentialError::new(
            CredentialErrorCode::MachineIdUnavailable,
            "MachineGuid not present in registry output",
        )
    })
}

/// Extract the `IOPlatformUUID` value from `ioreg -rd1` output.
#[must_use]
pub fn parse_ioreg_uuid(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("\"IOPlatformUUID\""))
        .and_then(|line| line.split('=').nth(1))
        .map(|value| value.trim().trim_matches('"').to_owned())
        .filter(|value| !value.is_empty())
}

/// Extract the `MachineGuid` value from `reg query` output.
#[must_use]
pub fn parse_registry_guid(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("MachineGuid"))
        .and_then(|line| line.split_whitespace().last())
        .filter(|value| *value != "MachineGuid")
        .map(str::to_owned)
}
