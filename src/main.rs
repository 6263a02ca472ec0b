// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cloudcall::backends::local::{LocalFunctionFactory, LocalQueue, LocalWrapper};
use cloudcall::config::{load_config, TrampolineConfig};
use cloudcall::protocol::{codec, Disposition, FunctionCall, ReceivableMessage, ResponseLedger};
use cloudcall::queue::TransportMetrics;
use cloudcall::trampoline::{HostContext, PushMessage, PushTrampoline};
use cloudcall::traits::QueueAdapter;

const REPLY_CHANNEL: &str = "replies";

struct DemoArgs {
    config: Option<String>,
    function: String,
    args: Vec<Value>,
}

/// Parse `[--config <file>] <function> [json-args...]`.
///
/// Arguments that are not valid JSON are passed as strings, so
/// `hello Andy` works as well as `hello '"Andy"'`.
fn parse_args(raw: &[String]) -> Result<DemoArgs> {
    let mut rest = raw.iter();
    let mut config = None;
    let mut function = None;
    let mut args = Vec::new();

    while let Some(arg) = rest.next() {
        if arg == "--config" && function.is_none() {
            let path = rest.next().context("--config requires a file path")?;
            config = Some(path.clone());
        } else if function.is_none() {
            function = Some(arg.clone());
        } else {
            args.push(serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.clone())));
        }
    }

    let Some(function) = function else {
        bail!("missing function name");
    };
    Ok(DemoArgs {
        config,
        function,
        args,
    })
}

fn usage(program: &str) {
    eprintln!("Usage: {} [--config <file>] <function> [json-args...]", program);
    eprintln!("Example: {} identity '\"abc123\"'", program);
    eprintln!("Example: {} --config trampoline.yaml sleep 3000", program);
    eprintln!(
        "Functions: {}",
        LocalFunctionFactory::list_available_implementations().join(", ")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let raw: Vec<String> = env::args().collect();
    let program = raw.first().map(String::as_str).unwrap_or("cloudcall-demo");
    let demo = match parse_args(raw.get(1..).unwrap_or_default()) {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("{}", e);
            usage(program);
            std::process::exit(1);
        }
    };

    let cfg = match &demo.config {
        Some(path) => load_config(path).with_context(|| format!("loading config {}", path))?,
        None => TrampolineConfig::default(),
    };

    run(demo, cfg).await
}

async fn run(demo: DemoArgs, cfg: TrampolineConfig) -> Result<()> {
    let metrics = Arc::new(TransportMetrics::new());
    let queue = Arc::new(LocalQueue::new(Arc::clone(&metrics)).with_long_poll_wait(cfg.long_poll_wait()));
    queue.init().await?;
    queue.create_channel(REPLY_CHANNEL).await;

    let wrapper = Arc::new(LocalWrapper::from_config(&cfg));
    let trampoline = PushTrampoline::new(queue.clone(), wrapper, &cfg);

    let call_id = format!("{}-{}", std::process::id(), Utc::now().timestamp_millis());
    let call = FunctionCall::new(call_id.clone(), demo.function.clone(), demo.args)
        .with_reply_channel(REPLY_CHANNEL);

    println!("🚀 cloudcall push trampoline demo");
    println!("═══════════════════════════════════");
    println!("Call:     {} ({})", call.call_id, call.name);
    println!("Args:     {}", serde_json::to_string(&call.args)?);
    println!();

    let push = PushMessage {
        data: Some(codec::encode_base64(&codec::serialize(&call)?)),
        ..Default::default()
    };
    let host = HostContext::new(format!("demo-{}", call_id)).with_event_timestamp(Utc::now());

    let Some(report) = trampoline.handle(push, &host).await else {
        bail!("call {} could not be decoded", call_id);
    };
    println!("Invocation finished: {} ({:?})", report.state, report.publish);
    println!();

    let cancel = CancellationToken::new();
    let mut ledger = ResponseLedger::new();
    while !ledger.is_settled(&call_id) {
        let batch = queue.receive(REPLY_CHANNEL, &cancel).await;
        if batch.messages.is_empty() {
            break;
        }
        for message in &batch.messages {
            print_message(message, ledger.observe(message))?;
        }
    }

    let snapshot = metrics.snapshot();
    println!();
    println!(
        "📊 Transport: {} published, {} received, {} bytes",
        snapshot.published, snapshot.received, snapshot.outbound_bytes
    );

    queue.dispose().await;

    if !ledger.is_settled(&call_id) {
        bail!("no response received for call {}", call_id);
    }
    Ok(())
}

fn print_message(message: &ReceivableMessage, disposition: Disposition) -> Result<()> {
    match message {
        ReceivableMessage::FunctionStarted { call_id } => {
            println!("💓 functionstarted  {}", call_id);
        }
        ReceivableMessage::CpuMetrics { call_id, metrics } => {
            println!("⏱️  cpumetrics       {} elapsed={}ms", call_id, metrics.elapsed_ms);
        }
        ReceivableMessage::Response { call_id, body, .. } => {
            let label = match disposition {
                Disposition::Duplicate => "duplicate",
                _ => "response",
            };
            println!("📨 {:<16} {}", label, call_id);
            match (body.value(), body.error()) {
                (Some(value), _) => println!("   ✅ {}", serde_json::to_string_pretty(value)?),
                (_, Some(error)) => println!("   ❌ {}", error),
                (None, None) => {}
            }
        }
        ReceivableMessage::DeadLetter { raw, .. } => {
            println!("⚠️  deadletter       {} bytes", raw.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_function_and_json_args() {
        let demo = parse_args(&args(&["concat", "\"abc\"", "def"])).unwrap();
        assert_eq!(demo.function, "concat");
        assert_eq!(demo.args, vec![json!("abc"), json!("def")]);
        assert!(demo.config.is_none());
    }

    #[test]
    fn test_parse_config_flag() {
        let demo = parse_args(&args(&["--config", "t.yaml", "fact", "5"])).unwrap();
        assert_eq!(demo.config.as_deref(), Some("t.yaml"));
        assert_eq!(demo.args, vec![json!(5)]);
    }

    #[test]
    fn test_parse_requires_function() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
    }
}
