//! Step dispatcher

use std::sync::Arc;
use std::time::{Duration, Instant};

use history_store::{generate_storage_key, ExecutionOutcome, ExecutionRecord, HistoryStore};
use itest_core_types::{ActionKind, TranslationEngine, WorkflowId};
use scenario_parser::StepInfo;
use serde_json::{json, Value};
use step_translator::{check, navigation_intent, ActionDescriptor, NavigationIntent, Translator};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::backend::{ActOptions, AgentTaskRequest, AutomationSession, ShapeHint, ACT_TIMEOUT_MS};
use crate::context::{ExecutionContext, BASE_URL_VAR};
use crate::errors::FlowError;
use crate::script::Script;

/// Translates, validates and dispatches steps, recording one entry per call.
pub struct StepExecutor {
    translator: Translator,
    store: Arc<HistoryStore>,
}

impl StepExecutor {
    pub fn new(translator: Translator, store: Arc<HistoryStore>) -> Self {
        Self { translator, store }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub async fn execute_step(
        &self,
        step: &StepInfo,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionRecord, FlowError> {
        if let Some(comment) = &step.comment {
            info!(workflow = %step.workflow, comment = %comment, "step note");
        }
        let descriptor = self.translator.translate(&step.action, ctx.variables());
        self.execute(descriptor, &step.workflow, ctx).await
    }

    /// Dispatches `descriptor` and appends exactly one record to the store.
    ///
    /// Only a session-provider failure is returned as `Err`; every other
    /// failure becomes a failed record.
    pub async fn execute(
        &self,
        descriptor: ActionDescriptor,
        workflow: &WorkflowId,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionRecord, FlowError> {
        let started = Instant::now();

        let result = match check(&descriptor) {
            Ok(()) => {
                let session = ctx.sessions().session(workflow).await?;
                info!(
                    kind = %descriptor.kind,
                    engine = %descriptor.engine,
                    rule = descriptor.rule_name(),
                    step = %descriptor.resolved_text,
                    "executing step"
                );
                self.dispatch(&descriptor, session.as_ref(), ctx).await
            }
            Err(err) => Err(FlowError::from(err)),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok(result) => ExecutionOutcome::Success { result },
            Err(err) => {
                let error = failure_message(&descriptor, &err);
                warn!(step = %descriptor.original_text, duration_ms, error = %error, "step failed");
                ExecutionOutcome::Failure { error }
            }
        };
        if outcome.is_success() {
            info!(kind = %descriptor.kind, duration_ms, "step succeeded");
        }

        let record = ExecutionRecord::new(descriptor, outcome, duration_ms, workflow.clone());
        self.store.append(record.clone());
        Ok(record)
    }

    /// Routes a validated descriptor to its handler.
    pub async fn dispatch(
        &self,
        descriptor: &ActionDescriptor,
        session: &dyn AutomationSession,
        ctx: &ExecutionContext,
    ) -> Result<Value, FlowError> {
        match descriptor.kind {
            ActionKind::Goto => self.goto(descriptor, session, ctx).await,
            ActionKind::Extract => self.extract(descriptor, session).await,
            ActionKind::Observe => observe(descriptor, session).await,
            ActionKind::Agent => {
                let instruction = descriptor
                    .param("instruction")
                    .unwrap_or(descriptor.resolved_text.as_str());
                agent_task(instruction, session, ctx).await
            }
            ActionKind::Act | ActionKind::Template => act(descriptor, session, ctx).await,
        }
    }

    async fn goto(
        &self,
        descriptor: &ActionDescriptor,
        session: &dyn AutomationSession,
        ctx: &ExecutionContext,
    ) -> Result<Value, FlowError> {
        let (action, url) = match navigation_intent(descriptor) {
            NavigationIntent::Refresh => {
                session.reload().await?;
                ("refresh", None)
            }
            NavigationIntent::Back => {
                session.go_back().await?;
                ("back", None)
            }
            intent => {
                let url = resolve_url(intent, descriptor, ctx);
                session.navigate(&url).await?;
                ("navigate", Some(url))
            }
        };
        let title = session.title().await.unwrap_or_else(|err| {
            debug!(error = %err, "page title unavailable");
            String::new()
        });
        Ok(json!({ "action": action, "url": url, "title": title }))
    }

    async fn extract(
        &self,
        descriptor: &ActionDescriptor,
        session: &dyn AutomationSession,
    ) -> Result<Value, FlowError> {
        let target = descriptor.param("target").unwrap_or_default();
        let shape = ShapeHint::classify(target);
        let data = session.extract(target, shape).await?;
        let key = descriptor
            .param("variable")
            .map(str::to_string)
            .unwrap_or_else(|| generate_storage_key(target));
        let artifact = self.store.put_artifact(key, data);
        info!(
            key = %artifact.key,
            shape = %shape,
            size = artifact.metadata.data_size,
            "data extracted"
        );
        Ok(json!({
            "key": artifact.key,
            "shape": shape,
            "dataSize": artifact.metadata.data_size,
            "data": artifact.data,
        }))
    }
}

async fn observe(
    descriptor: &ActionDescriptor,
    session: &dyn AutomationSession,
) -> Result<Value, FlowError> {
    let target = descriptor.param("target").unwrap_or_default();
    let elements = session.observe(target).await?;
    debug!(observed = target, count = elements.len(), "elements observed");
    Ok(json!({ "target": target, "count": elements.len(), "elements": elements }))
}

/// A non-fatal `error` in a completed result is reported, not raised.
async fn agent_task(
    instruction: &str,
    session: &dyn AutomationSession,
    ctx: &ExecutionContext,
) -> Result<Value, FlowError> {
    let request = AgentTaskRequest::new(instruction, ctx.agent_max_steps());
    let result = session.run_agent_task(&request).await?;
    if let Some(error) = &result.error {
        warn!(instruction, error = %error, completed = result.completed, "agent task reported an error");
    }
    Ok(json!({
        "instruction": instruction,
        "steps": result.steps.len(),
        "result": result.result,
        "error": result.error,
        "completed": result.completed,
    }))
}

async fn act(
    descriptor: &ActionDescriptor,
    session: &dyn AutomationSession,
    ctx: &ExecutionContext,
) -> Result<Value, FlowError> {
    match (descriptor.engine, descriptor.generated_code.as_deref()) {
        (TranslationEngine::Rules, Some(code)) => {
            let script = Script::parse(code)?;
            let report = script.run(session, ctx.agent_max_steps()).await?;
            Ok(json!({ "script": code, "executed": report.executed, "outputs": report.outputs }))
        }
        (TranslationEngine::Agent, _) => {
            let instruction = descriptor
                .param("instruction")
                .or_else(|| descriptor.param("raw"))
                .unwrap_or(descriptor.resolved_text.as_str());
            agent_task(instruction, session, ctx).await
        }
        _ => {
            let options = ActOptions::generic(descriptor.resolved_variables());
            let call = session.act(&descriptor.original_text, &options);
            let result = timeout(Duration::from_millis(ACT_TIMEOUT_MS), call)
                .await
                .map_err(|_| FlowError::Timeout(ACT_TIMEOUT_MS))??;
            Ok(json!({
                "action": descriptor.original_text,
                "params": descriptor.params,
                "result": result,
            }))
        }
    }
}

/// The goto target itself, or the variable it names, then the base URL.
///
/// A target left as an unresolved `%NAME%` placeholder falls through to the base URL.
fn resolve_url(intent: NavigationIntent, descriptor: &ActionDescriptor, ctx: &ExecutionContext) -> String {
    let target = match intent {
        NavigationIntent::Url(url) => url,
        _ => String::new(),
    };
    let name = target
        .strip_prefix('%')
        .and_then(|rest| rest.strip_suffix('%'))
        .unwrap_or(&target);
    let resolved = lookup_variable(name, descriptor, ctx).unwrap_or_else(|| target.clone());
    if !resolved.is_empty() && !resolved.starts_with('%') {
        return resolved;
    }
    ctx.variables()
        .get(BASE_URL_VAR)
        .map(str::to_string)
        .unwrap_or_else(|| ctx.base_url().to_string())
}

fn lookup_variable(name: &str, descriptor: &ActionDescriptor, ctx: &ExecutionContext) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    ctx.variables()
        .get(name)
        .map(str::to_string)
        .or_else(|| descriptor.resolved_variables().remove(name))
}

/// Rule-matched failures carry the rule, matcher, params and code ahead of the cause.
fn failure_message(descriptor: &ActionDescriptor, err: &FlowError) -> String {
    if descriptor.is_fallback() || descriptor.matched_pattern_name.is_none() {
        return err.to_string();
    }
    let params = serde_json::to_string_pretty(&descriptor.params).unwrap_or_else(|_| "{}".to_string());
    let mut context = vec![format!("rule: {}", descriptor.rule_name())];
    if let Some(pattern) = &descriptor.matched_pattern {
        context.push(format!("pattern: {pattern}"));
    }
    context.push(format!("params: {params}"));
    if let Some(code) = &descriptor.generated_code {
        context.push(format!("code:\n{code}"));
    }
    format!("rule execution failed:\n{}\ncause: {err}", context.join("\n"))
}
