use std::io::Write;

use crate::error::Result;
use crate::ports::{Catalog, LogoutOutcome};

pub async fn run<C: Catalog, W: Write>(catalog: &C, out: &mut W) -> Result<()> {
    match catalog.logout().await? {
        LogoutOutcome::LoggedOut => writeln!(out, "logged out")?,
        LogoutOutcome::NoSession => writeln!(out, "no active session")?,
    }
    Ok(())
}
