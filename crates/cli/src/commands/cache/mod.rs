use crate::execute::RunContext;
use eyre::WrapErr;
use stash_cache::CacheResult;
use stash_core::RuleKey;
use std::path::Path;

fn parse_key(key: &str) -> eyre::Result<RuleKey> {
    RuleKey::new(key).wrap_err_with(|| format!("invalid rule key '{key}'"))
}

/// Restore an artifact, printing `hit`, `miss` or `skipped`
pub fn fetch(ctx: &RunContext<'_>, key: &str, output: &Path) -> eyre::Result<()> {
    let key = parse_key(key)?;
    let cache = ctx.cache()?;

    let result = cache
        .fetch(&key, output)
        .wrap_err_with(|| format!("failed to fetch {key}"))?;

    match result {
        CacheResult::Hit { .. } => println!("hit {}", output.display()),
        CacheResult::Miss => println!("miss"),
        CacheResult::Skipped => println!("skipped"),
    }
    Ok(())
}

/// Store an artifact, printing `stored` or `skipped`
pub fn store(ctx: &RunContext<'_>, key: &str, file: &Path) -> eyre::Result<()> {
    let key = parse_key(key)?;
    let cache = ctx.cache()?;

    if !cache.is_store_supported() {
        println!("skipped");
        return Ok(());
    }

    cache
        .store(&key, file)
        .wrap_err_with(|| format!("failed to store {} as {key}", file.display()))?;
    println!("stored {key}");
    Ok(())
}
