use anyhow::Result;

fn main() -> Result<()> {
    itemsense::cli::run()?;
    Ok(())
}
