pub mod create;

use anyhow::{bail, Result};

pub fn destroy() -> Result<()> {
    bail!("destroy command not yet implemented")
}

pub fn root_credentials() -> Result<()> {
    bail!("root-credentials command not yet implemented")
}
