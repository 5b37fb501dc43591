use crate::config::{self, SETUP_COMMAND};
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::Deserialize;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Display, Deref, From, Into, AsRef)]
#[serde(transparent)]
pub struct ExecCommand(String);

piemenu_core::impl_string_newtype!(ExecCommand);

/// Runs `cmd` through `sh -c`, detached from the daemon. The setup placeholder writes the
/// default config and opens it instead.
pub fn spawn(cmd: &ExecCommand) -> std::io::Result<()> {
    let mut command = if cmd.as_str() == SETUP_COMMAND {
        let path = config::write_default_config()?;
        let mut open = Command::new("xdg-open");
        open.arg(path);
        open
    } else {
        let mut sh = Command::new("sh");
        sh.arg("-c").arg(cmd.as_str());
        sh
    };

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    log::info!("Spawned '{}' as pid {}", cmd, child.id());

    // reap it so finished commands do not linger as zombies
    std::thread::spawn(move || child.wait());
    Ok(())
}
