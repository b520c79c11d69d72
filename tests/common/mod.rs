#![allow(dead_code)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509, X509Builder, X509Name, X509NameBuilder};
use vpn_ca_server::{
    ca::{CaResult, ToolOutput, ToolRunner, VpnCa},
    config::{CaBackend, CaConfig},
    setup::native_ca_with_runner,
    telemetry,
};

pub const VPN_CA: &str = "/usr/libexec/vpn-ca";
pub const OPENSSL: &str = "/usr/bin/openssl";

/// Stand-in for the `vpn-ca` helper and `openssl rsa`, minting real
/// certificates with the openssl crate.
#[derive(Default)]
pub struct FakeCaTool {
    /// Arguments of every call, in order.
    pub calls: Mutex<Vec<Vec<String>>>,
    /// Exit code and output returned for every `vpn-ca` call.
    pub vpn_ca_failure: Option<(i32, String)>,
    /// Exit code and output returned for every `openssl` call.
    pub openssl_failure: Option<(i32, String)>,
    /// `--init` exits 0 without writing anything.
    pub silent_init: bool,
}

impl FakeCaTool {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with(&self, flag: &str) -> usize {
        self.calls()
            .iter()
            .filter(|args| args.iter().any(|a| a == flag))
            .count()
    }

    fn mint(&self, args: &[String]) -> Result<(), String> {
        let ca_dir = PathBuf::from(value_of(args, "--ca-dir").ok_or("missing --ca-dir")?);

        if args.iter().any(|a| a == "--init") {
            if self.silent_init {
                return Ok(());
            }
            let (cert, key) = generate_ca();
            std::fs::write(ca_dir.join("ca.crt"), cert.to_pem().unwrap()).unwrap();
            std::fs::write(
                ca_dir.join("ca.key"),
                key.rsa().unwrap().private_key_to_pem().unwrap(),
            )
            .unwrap();
            return Ok(());
        }

        let (common_name, not_after) = if let Some(cn) = value_of(args, "--server") {
            (cn, Utc::now() + chrono::Duration::days(365))
        } else if let Some(cn) = value_of(args, "--client") {
            let not_after = value_of(args, "--not-after").ok_or("missing --not-after")?;
            let not_after = DateTime::parse_from_rfc3339(&not_after)
                .map_err(|e| format!("invalid --not-after: {e}"))?;
            (cn, not_after.with_timezone(&Utc))
        } else {
            return Err(format!("unsupported arguments: {args:?}"));
        };

        let ca_cert = std::fs::read(ca_dir.join("ca.crt")).map_err(|e| e.to_string())?;
        let ca_key = std::fs::read(ca_dir.join("ca.key")).map_err(|e| e.to_string())?;
        let ca_cert = X509::from_pem(&ca_cert).unwrap();
        let ca_key = PKey::private_key_from_pem(&ca_key).unwrap();

        let (cert, key) = generate_leaf(&ca_cert, &ca_key, &common_name, not_after);
        std::fs::write(ca_dir.join(format!("{common_name}.crt")), cert).unwrap();
        std::fs::write(ca_dir.join(format!("{common_name}.key")), key).unwrap();
        Ok(())
    }

    fn convert_key(&self, args: &[String]) -> Result<(), String> {
        let input = value_of(args, "-in").ok_or("missing -in")?;
        let output = value_of(args, "-out").ok_or("missing -out")?;
        let pem = std::fs::read(&input).map_err(|e| e.to_string())?;
        let key = PKey::private_key_from_pem(&pem).map_err(|e| e.to_string())?;
        std::fs::write(output, key.rsa().unwrap().private_key_to_pem().unwrap())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl ToolRunner for FakeCaTool {
    async fn run(&self, program: &Path, args: &[OsString]) -> CaResult<ToolOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(args.clone());

        let is_openssl = program == Path::new(OPENSSL);
        let failure = if is_openssl {
            &self.openssl_failure
        } else {
            &self.vpn_ca_failure
        };

        if let Some((code, output)) = failure {
            return Ok(ToolOutput {
                exit_code: Some(*code),
                output: output.clone(),
            });
        }

        let result = if is_openssl {
            self.convert_key(&args)
        } else {
            self.mint(&args)
        };

        Ok(match result {
            Ok(()) => ToolOutput {
                exit_code: Some(0),
                output: String::new(),
            },
            Err(output) => ToolOutput {
                exit_code: Some(1),
                output,
            },
        })
    }
}

fn value_of(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

pub fn ca_config(root: &Path) -> CaConfig {
    CaConfig {
        backend: CaBackend::Native,
        dir: root.join("ca"),
        vpn_ca_path: PathBuf::from(VPN_CA),
        openssl_path: PathBuf::from(OPENSSL),
        legacy_dir: Some(root.join("easy-rsa")),
        tool_timeout_secs: 10,
    }
}

pub fn test_ca(root: &Path, tool: FakeCaTool) -> (VpnCa, Arc<FakeCaTool>) {
    telemetry::init_tracing();
    let tool = Arc::new(tool);
    let ca = native_ca_with_runner(&ca_config(root), tool.clone());
    (ca, tool)
}

/// Writes an easy-rsa style CA (PKCS#8 key) below `<root>/easy-rsa/pki`.
pub fn write_legacy_ca(root: &Path, cert: bool, key: bool) -> (Vec<u8>, Vec<u8>) {
    let pki = root.join("easy-rsa").join("pki");
    std::fs::create_dir_all(pki.join("private")).unwrap();

    let (ca_cert, ca_key) = generate_ca();
    let cert_pem = ca_cert.to_pem().unwrap();
    let key_pem = ca_key.private_key_to_pem_pkcs8().unwrap();
    if cert {
        std::fs::write(pki.join("ca.crt"), &cert_pem).unwrap();
    }
    if key {
        std::fs::write(pki.join("private").join("ca.key"), &key_pem).unwrap();
    }
    (cert_pem, key_pem)
}

pub fn generate_ca() -> (X509, PKey<Private>) {
    let key_pair = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut cert_builder = X509Builder::new().unwrap();
    cert_builder.set_version(2).unwrap();
    cert_builder
        .set_serial_number(&generate_serial_number())
        .unwrap();

    let subject_name = create_x509_name(&[("CN", "VPN CA")]);
    cert_builder.set_subject_name(&subject_name).unwrap();
    cert_builder.set_issuer_name(&subject_name).unwrap();
    cert_builder.set_pubkey(&key_pair).unwrap();

    let now = Utc::now().timestamp();
    cert_builder
        .set_not_before(&Asn1Time::from_unix(now - 60).unwrap())
        .unwrap();
    cert_builder
        .set_not_after(&Asn1Time::days_from_now(3650).unwrap())
        .unwrap();

    cert_builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    cert_builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    cert_builder
        .sign(&key_pair, MessageDigest::sha256())
        .unwrap();

    (cert_builder.build(), key_pair)
}

fn generate_leaf(
    ca_cert: &X509,
    ca_key: &PKey<Private>,
    common_name: &str,
    not_after: DateTime<Utc>,
) -> (Vec<u8>, Vec<u8>) {
    let key_pair = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut cert_builder = X509Builder::new().unwrap();
    cert_builder.set_version(2).unwrap();
    cert_builder
        .set_serial_number(&generate_serial_number())
        .unwrap();
    cert_builder
        .set_subject_name(&create_x509_name(&[("CN", common_name)]))
        .unwrap();
    cert_builder
        .set_issuer_name(ca_cert.subject_name())
        .unwrap();
    cert_builder.set_pubkey(&key_pair).unwrap();

    let now = Utc::now().timestamp();
    cert_builder
        .set_not_before(&Asn1Time::from_unix(now - 60).unwrap())
        .unwrap();
    cert_builder
        .set_not_after(&Asn1Time::from_unix(not_after.timestamp()).unwrap())
        .unwrap();
    cert_builder.sign(ca_key, MessageDigest::sha256()).unwrap();

    (
        cert_builder.build().to_pem().unwrap(),
        key_pair.private_key_to_pem_pkcs8().unwrap(),
    )
}

fn generate_serial_number() -> Asn1Integer {
    let mut serial = BigNum::new().unwrap();
    serial.rand(128, MsbOption::MAYBE_ZERO, false).unwrap();
    serial.to_asn1_integer().unwrap()
}

fn create_x509_name(entries: &[(&str, &str)]) -> X509Name {
    let mut name_builder = X509NameBuilder::new().unwrap();
    for (key, value) in entries {
        name_builder.append_entry_by_text(key, value).unwrap();
    }
    name_builder.build()
}
