use anyhow::Result;
use tracing::debug;

use crate::bootstrap::{ModeResolver, ResolutionOutcome};

pub async fn run_resolve(resolver: &ModeResolver) -> Result<()> {
    let outcome = resolver.resolve().await;
    debug!("Resolved: {}", outcome);
    match outcome {
        ResolutionOutcome::RemoteMode(locator) => {
            println!("🌐 Remote mode");
            println!("   Locator: {}", locator);
        }
        ResolutionOutcome::NativeMode => {
            println!("📱 Native mode");
        }
        ResolutionOutcome::Error(msg) => {
            println!("⚠️  {}", msg);
            println!("   The app would start in native mode.");
        }
    }
    Ok(())
}
