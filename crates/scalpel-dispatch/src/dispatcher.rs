//! `dispatch()` (spec.md §4.9): admits a request via the policy engine,
//! resolves the target component, runs it under a wall-clock budget,
//! and converts the outcome into a `ToolResponseEnvelope`.

use crate::envelope::{timeout_error, ResponseErrorBody, ToolRequest, ToolResponseEnvelope};
use crate::registry::ToolRegistry;
use scalpel_core::error::ScalpelError;
use scalpel_policy::{PolicyEngine, RequestContext};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct Dispatcher {
    registry: ToolRegistry,
    policy: Arc<PolicyEngine>,
    tool_version: String,
}

impl Dispatcher {
    /// `policy` is shared (not owned) because crawl-style handlers in the
    /// registry re-check it incrementally against the same rule set
    /// (spec.md §8 S6) rather than only once at admission time.
    pub fn new(registry: ToolRegistry, policy: Arc<PolicyEngine>, tool_version: impl Into<String>) -> Self {
        Self { registry, policy, tool_version: tool_version.into() }
    }

    /// Run one tool call end to end. `policy_ctx` carries the facts the
    /// policy engine needs (tier, symbol/edge kinds touched so far,
    /// declared field values); `timeout` is the tier-dependent
    /// wall-clock budget from spec.md §5.
    pub fn dispatch(&self, request: ToolRequest, policy_ctx: &RequestContext, timeout: Duration) -> ToolResponseEnvelope {
        let start = Instant::now();

        if let Err(err) = self.policy.admit(policy_ctx) {
            let scalpel_err: ScalpelError = err.into();
            return self.failure_envelope(&request, start, &scalpel_err);
        }

        let Some(handler) = self.registry.resolve(&request.tool_id) else {
            let err = ScalpelError::new(
                scalpel_core::error::ErrorKind::NotFound,
                format!("no component registered for tool_id `{}`", request.tool_id),
            );
            return self.failure_envelope(&request, start, &err);
        };

        let token = request.cancellation_token.clone();
        let req_for_thread = request.clone();
        let token_for_thread = token.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = handler(&req_for_thread, &token_for_thread);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(data)) => ToolResponseEnvelope::success(
                request.tier_context.clone(),
                self.tool_version.clone(),
                request.tool_id.clone(),
                request.request_id.clone(),
                elapsed_ms(start),
                data,
            ),
            Ok(Err(err)) => self.failure_envelope(&request, start, &err),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Cooperative: the handler observes cancellation at its
                // next suspension point and returns on its own; we do
                // not wait for it here (spec.md §5: cancellation must
                // return within one batch's duration, not immediately).
                token.cancel();
                self.failure_envelope(&request, start, &timeout_error())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let err = ScalpelError::internal("component thread terminated without a response");
                self.failure_envelope(&request, start, &err)
            }
        }
    }

    fn failure_envelope(&self, request: &ToolRequest, start: Instant, err: &ScalpelError) -> ToolResponseEnvelope {
        ToolResponseEnvelope::failure(
            request.tier_context.clone(),
            self.tool_version.clone(),
            request.tool_id.clone(),
            request.request_id.clone(),
            elapsed_ms(start),
            ResponseErrorBody::from(err),
        )
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;
    use scalpel_core::cancel::CancellationToken;
    use scalpel_policy::manifest::{PolicyFileEntry, PolicyManifest};
    use scalpel_policy::tier::TierBundle;
    use sha2::{Digest, Sha256};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn hash_hex(bytes: &[u8]) -> String {
        let digest: [u8; 32] = Sha256::digest(bytes).into();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn test_policy(dir: &std::path::Path) -> Arc<PolicyEngine> {
        std::fs::write(dir.join("rules.json"), b"{}").unwrap();
        let entry = PolicyFileEntry {
            path: PathBuf::from("rules.json"),
            sha256: hash_hex(b"{}"),
            created_at: chrono::Utc::now(),
        };
        let manifest = PolicyManifest::signed(vec![entry], b"secret");
        Arc::new(PolicyEngine::load(vec![], vec![TierBundle::new("free")], manifest, dir, b"secret".to_vec()))
    }

    fn request(tool_id: &str) -> ToolRequest {
        ToolRequest {
            tool_id: tool_id.to_string(),
            arguments: serde_json::json!({}),
            request_id: "r1".to_string(),
            tier_context: "free".to_string(),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[test]
    fn successful_handler_produces_a_success_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ToolRegistry::new();
        registry.register("echo", Arc::new(|req: &ToolRequest, _t: &CancellationToken| Ok(req.arguments.clone())));
        let dispatcher = Dispatcher::new(registry, test_policy(dir.path()), "0.1.0");

        let ctx = RequestContext { tier: "free".into(), ..Default::default() };
        let envelope = dispatcher.dispatch(request("echo"), &ctx, Duration::from_secs(1));
        assert!(envelope.error.is_none());
        assert_eq!(envelope.tool_id, "echo");
    }

    #[test]
    fn unknown_tool_id_produces_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::new();
        let dispatcher = Dispatcher::new(registry, test_policy(dir.path()), "0.1.0");

        let ctx = RequestContext { tier: "free".into(), ..Default::default() };
        let envelope = dispatcher.dispatch(request("ghost"), &ctx, Duration::from_secs(1));
        assert_eq!(envelope.error.unwrap().code, "not_found");
    }

    #[test]
    fn slow_handler_times_out_and_cancels_the_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ToolRegistry::new();
        registry.register(
            "slow",
            Arc::new(|_req: &ToolRequest, token: &CancellationToken| {
                while !token.is_cancelled() {
                    thread::sleep(Duration::from_millis(5));
                }
                Ok(serde_json::json!({}))
            }),
        );
        let dispatcher = Dispatcher::new(registry, test_policy(dir.path()), "0.1.0");

        let req = request("slow");
        let token = req.cancellation_token.clone();
        let ctx = RequestContext { tier: "free".into(), ..Default::default() };
        let envelope = dispatcher.dispatch(req, &ctx, Duration::from_millis(20));
        assert_eq!(envelope.error.unwrap().code, "timeout");
        thread::sleep(Duration::from_millis(50));
        assert!(token.is_cancelled());
    }
}
