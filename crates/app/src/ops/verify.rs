use std::path::PathBuf;

use clap::Args;

use common::content::ContentStateMachine;
use common::notify::NoopNotifier;

use crate::op::ContentOpError;

/// Run the pre-post approval check without posting
#[derive(Args, Debug, Clone)]
pub struct Verify {
    pub path: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for Verify {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let path = ctx.item_path(&self.path);
        let verified = ContentStateMachine::new(&ws, &NoopNotifier).verify(&path)?;
        let report = verified.report();

        let signature = match &report.signed_by {
            Some(fingerprint) => format!("valid (key {})", fingerprint),
            None => "not required (no signing key)".to_string(),
        };
        Ok(format!(
            "{}: ok to post\n  platform:    {}\n  approved by: {}\n  hash:        {}\n  signature:   {}",
            path.display(),
            report.platform,
            report.approved_by.as_deref().unwrap_or("unknown"),
            report.content_hash,
            signature
        ))
    }
}
