//! Generate the feed and data files

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

pub fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();
    Generator::new(site).generate()?;
    tracing::info!("Generated in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
