// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::Utc;
use sigbox::config::load_and_validate_config;
use sigbox::observability::init_tracing;
use sigbox::pool::SigningPool;
use sigbox::protocol::{AddRequest, DigestRequest, SignInput};
use sigbox::sandbox::ModuleRegistry;
use sigbox::signer::{verify_bearer, PluginSigner, SignerKind, SignerRequest, SignerResponse};

const DEMO_ACCESS_KEY: &str = "demo-app";
const DEMO_SECRET_KEY: &str = "demo-secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config.yaml|config.toml> [requests]", args[0]);
        eprintln!("Example: {} configs/sigbox.yaml 8", args[0]);
        std::process::exit(1);
    }
    let requests: usize = match args.get(2) {
        Some(n) => n.parse().with_context(|| format!("invalid request count '{}'", n))?,
        None => 4,
    };

    let cfg = load_and_validate_config(&args[1])
        .with_context(|| format!("loading {}", args[1]))?;

    println!("🔏 sigbox signing demo");
    println!("═══════════════════════════════════");
    println!("Plugin manifest: {}", cfg.plugin.manifest.display());
    println!("Variant: {}", cfg.plugin.variant);
    println!("Requests: {}", requests);
    println!();

    let registry = ModuleRegistry::new()?;
    let artifact = registry
        .compile_file(&cfg.plugin.manifest)
        .context("compiling plugin")?;
    let signer = PluginSigner::new(artifact, cfg.plugin.variant, cfg.sandbox.instance_config())?;
    let pool = SigningPool::from_config(signer, &cfg.pool);

    let batch = build_requests(cfg.plugin.variant, requests);
    let started = Instant::now();
    let results = pool.run_all(batch).await;

    let mut failures = 0;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(SignerResponse::Sum(sum)) => println!("✅ #{:<3} sum = {}", index, sum),
            Ok(SignerResponse::Digest(digest)) => {
                println!("✅ #{:<3} hmac256 = {}", index, hex(&digest))
            }
            Ok(SignerResponse::Signed(output)) => {
                let token = output
                    .authorization()
                    .context("sign returned no Authorization header")?;
                let claims = verify_bearer(token, DEMO_SECRET_KEY.as_bytes())?;
                println!(
                    "✅ #{:<3} account={} info={} app_key={} exp={}",
                    index,
                    claims.account_uuid,
                    claims.account_info,
                    claims.app_key,
                    claims
                        .expires_at()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| claims.exp.to_string())
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("❌ #{:<3} {}", index, e);
            }
        }
    }

    println!();
    println!("⏱️  {} requests in {:?}", requests, started.elapsed());
    if failures > 0 {
        bail!("{} of {} requests failed", failures, requests);
    }
    Ok(())
}

fn build_requests(kind: SignerKind, count: usize) -> Vec<SignerRequest> {
    (0..count)
        .map(|i| match kind {
            SignerKind::Arithmetic => SignerRequest::Add(AddRequest {
                a: i as i64,
                b: 1000,
            }),
            SignerKind::DelegatedDigest => {
                SignerRequest::Digest(DigestRequest::new("1234567890", format!("request-{}", i)))
            }
            SignerKind::AuthorizationIssuer => SignerRequest::Sign(
                SignInput::new("GET", format!("https://api.example.com/v1/items/{}", i), Utc::now())
                    .with_header("X-Account-UUID", format!("account-{:04}", i))
                    .with_header("X-Account-Info", "demo")
                    .with_credentials(DEMO_ACCESS_KEY, DEMO_SECRET_KEY),
            ),
        })
        .collect()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
