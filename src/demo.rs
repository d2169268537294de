//! Fixed walkthrough: create a session, run Python, JavaScript and a shell
//! command in it, then delete it.
//!
//! Step failures are reported and the walkthrough moves on, so the session
//! is always cleaned up.

use agentbay_sdk::{AgentBay, CreateSessionParams};

const PYTHON_CODE: &str = r#"
print("Hello from Python!")
result = 2 + 3
print(f"2 + 3 = {result}")
"#;

const JAVASCRIPT_CODE: &str = r#"
console.log("Hello from JavaScript!");
const result = 2 + 3;
console.log("2 + 3 =", result);
"#;

const SHELL_COMMAND: &str = "echo 'Hello from shell!'";

const PYTHON_TIMEOUT_S: u64 = 1000;
const JAVASCRIPT_TIMEOUT_S: u64 = 30;
const SHELL_TIMEOUT_MS: u64 = 5000;

pub async fn run(client: &AgentBay, image_id: &str) {
    let created = match client
        .create(CreateSessionParams::new().with_image_id(image_id))
        .await
    {
        Ok(created) => created,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            println!("Failed to create session: {}", e);
            return;
        }
    };

    let session = created.data;
    println!("Session created with ID: {}", session.session_id());
    println!("Request ID: {}", created.request_id);

    println!("\n=== Running Python Code ===");
    match session
        .code()
        .run_code(PYTHON_CODE, "python", PYTHON_TIMEOUT_S)
        .await
    {
        Ok(result) => {
            println!("Python code executed successfully!");
            println!("Request ID: {}", result.request_id);
            println!("Output:\n{}", result.data.output);
        }
        Err(e) => println!("Failed to run Python code: {}", e),
    }

    println!("\n=== Running JavaScript Code ===");
    match session
        .code()
        .run_code(JAVASCRIPT_CODE, "javascript", JAVASCRIPT_TIMEOUT_S)
        .await
    {
        Ok(result) => {
            println!("JavaScript code executed successfully!");
            println!("Request ID: {}", result.request_id);
            println!("Output:\n{}", result.data.output);
        }
        Err(e) => println!("Failed to run JavaScript code: {}", e),
    }

    println!("\n=== Running Shell Command ===");
    match session
        .command()
        .execute_command(SHELL_COMMAND, SHELL_TIMEOUT_MS)
        .await
    {
        Ok(result) => {
            println!("Command executed successfully!");
            println!("Request ID: {}", result.request_id);
            println!("Output:\n{}", result.data.output);
        }
        Err(e) => println!("Failed to execute command: {}", e),
    }

    println!("\n=== Cleaning up ===");
    match session.delete().await {
        Ok(deleted) if deleted.data.success => println!(
            "Session deleted successfully! Request ID: {}",
            deleted.request_id
        ),
        Ok(deleted) => println!(
            "Failed to delete session. Request ID: {}",
            deleted.request_id
        ),
        Err(e) => println!("Failed to delete session: {}", e),
    }
}
