//! Smoke-test binary for verifying Gemini API access
//! This is a utility binary, not part of the main application

use gemini_chat_backend::chat::prompt::build_contents;
use gemini_chat_backend::chat::ChatRequest;
use gemini_chat_backend::config::Config;
use gemini_chat_backend::gemini::GeminiClient;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing Gemini API access from Rust...\n");

    let config = Config::from_env();

    // Test 1: Check if API key is available
    println!("1. Checking for GEMINI_API_KEY environment variable...");
    if config.gemini.api_key.is_empty() {
        eprintln!("   ✗ GEMINI_API_KEY not found in environment");
        eprintln!("   Make sure to export it: export GEMINI_API_KEY=\"your-key\"");
        return Err("GEMINI_API_KEY not set".into());
    }
    println!(
        "   ✓ GEMINI_API_KEY is set (length: {} chars)",
        config.gemini.api_key.len()
    );

    // Test 2: Show target
    println!("\n2. Target model: {}", config.gemini.model);
    println!("   Base URL: {}", config.gemini.api_base_url);

    // Test 3: Execute a query
    let message = env::args()
        .nth(1)
        .unwrap_or_else(|| "What is 2+2? Answer in one sentence.".to_string());
    println!("\n3. Executing test query...");
    println!("   Query: '{}'", message);

    let request = ChatRequest {
        message,
        ..Default::default()
    };
    let contents = build_contents(&config.chat, &request);
    let client = GeminiClient::new(&config.gemini)?;

    match client.generate_content(contents).await {
        Ok(reply) => {
            println!("   ✓ Response received:");
            println!("   {}", reply.trim());
        }
        Err(e) => {
            eprintln!("   ✗ Query failed: {}", e);
            eprintln!("\n   Troubleshooting:");
            eprintln!("   - Make sure GEMINI_API_KEY is valid");
            eprintln!("   - Check GEMINI_MODEL ({}) is available to your key", config.gemini.model);
            return Err(e.into());
        }
    }

    println!("\n✓ All tests completed!");
    Ok(())
}
