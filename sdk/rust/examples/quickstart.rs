use agentbay_sdk::{AgentBay, CreateSessionParams};

#[tokio::main]
async fn main() -> agentbay_sdk::Result<()> {
    let client = AgentBay::builder().build()?;

    // Session is released when the closure returns, even on error
    client
        .with_session(
            CreateSessionParams::new().with_image_id("code_latest"),
            |session| async move {
                let info = session.info().await?;
                println!("Resource URL: {}", info.data.resource_url);

                let result = session
                    .code()
                    .run_code("import sys; print(sys.version)", "python", 60)
                    .await?;
                println!("{}", result.data.output);
                println!("Request ID: {}", result.request_id);

                let link = session.get_link(None, None).await?;
                println!("Link: {}", link.data);
                Ok(())
            },
        )
        .await?;

    Ok(())
}
