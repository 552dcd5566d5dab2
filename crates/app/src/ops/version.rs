use std::convert::Infallible;

use clap::Args;

use crate::version::build_info;

#[derive(Args, Debug, Clone)]
pub struct Version;

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(build_info().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::Op;

    #[tokio::test]
    async fn test_version_names_the_package() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&[], false));
        let output = Version.execute(&ctx).await.unwrap();
        assert!(output.contains(env!("CARGO_PKG_VERSION")));
    }
}
