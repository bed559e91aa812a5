use eyre::WrapErr;
use stash_core::RuleKey;
use std::path::Path;

/// Print the content key of a file
pub fn execute(file: &Path) -> eyre::Result<()> {
    let contents =
        std::fs::read(file).wrap_err_with(|| format!("failed to read {}", file.display()))?;
    println!("{}", RuleKey::digest(&contents));
    Ok(())
}
