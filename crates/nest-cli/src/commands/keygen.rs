use std::fs;
use std::path::PathBuf;

use clap::Args;
use log::info;
use nest_core::NestError;
use nest_crypto::generate_rsa_keypair;

use crate::CliResult;

/// Generates an RSA key pair for recipient mode, as PKCS#8 and SPKI PEM files
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Private key file, keep it secret
    #[arg(long, value_name = "private key file", required = true)]
    pub private_out: PathBuf,

    /// Public key file, hand it to whoever hides payloads for you
    #[arg(long, value_name = "public key file", required = true)]
    pub public_out: PathBuf,

    #[arg(long, value_name = "bits", default_value_t = 4096)]
    pub bits: usize,
}

impl KeygenArgs {
    pub fn run(self) -> CliResult<()> {
        let (private_pem, public_pem) = generate_rsa_keypair(self.bits)?;

        fs::write(&self.private_out, private_pem.as_bytes())
            .map_err(|source| NestError::WriteError { source })?;
        fs::write(&self.public_out, public_pem)
            .map_err(|source| NestError::WriteError { source })?;

        info!(
            "wrote {} bit key pair to {:?} and {:?}",
            self.bits, self.private_out, self.public_out
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_crypto::{private_key_from_pem, public_key_from_pem};
    use tempfile::TempDir;

    #[test]
    fn writes_loadable_pem_files() {
        let dir = TempDir::new().unwrap();
        let args = KeygenArgs {
            private_out: dir.path().join("id.pem"),
            public_out: dir.path().join("id.pub.pem"),
            bits: 1024,
        };
        args.run().unwrap();

        let private_pem = fs::read_to_string(dir.path().join("id.pem")).unwrap();
        let public_pem = fs::read_to_string(dir.path().join("id.pub.pem")).unwrap();
        assert!(private_key_from_pem(&private_pem).is_ok());
        assert!(public_key_from_pem(&public_pem).is_ok());
    }
}
