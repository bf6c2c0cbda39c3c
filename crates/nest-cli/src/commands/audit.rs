use std::path::PathBuf;

use clap::Args;
use nest_core::audit::SecureEventLog;
use nest_core::NestError;

use crate::cli::ask_for_password;
use crate::CliResult;

/// Decrypts an audit log and prints one JSON record per line
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Audit log to read
    #[arg(short = 'i', long = "in", value_name = "log file", required = true)]
    pub log: PathBuf,

    /// Administrator password of the log
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,
}

impl AuditArgs {
    pub fn run(self) -> CliResult<()> {
        let password = self
            .password
            .or_else(|| ask_for_password("Audit log password", false))
            .ok_or(NestError::MissingKey("audit log password"))?;

        for record in SecureEventLog::read_all(&self.log, &password)? {
            let line = serde_json::to_string(&record)
                .map_err(|e| NestError::Format(format!("cannot print audit record: {e}")))?;
            println!("{line}");
        }
        Ok(())
    }
}
